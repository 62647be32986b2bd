//! Ratatui front-end for the library catalog. `app` owns controller state and
//! key routing, `actions` holds the dispatchers and their continuations, and
//! `render` draws whichever view the router has made active.

mod actions;
mod app;
mod forms;
mod helpers;
mod render;
mod terminal;

#[cfg(test)]
mod tests;

pub use app::{App, Intent};
pub use terminal::run_app;
