//! Durable key/value storage for the few entries the client keeps between
//! runs, split across logical submodules.

mod connection;
mod items;

pub use connection::{default_storage_path, ensure_schema, open_in_memory};
pub use items::{get_item, remove_item, set_item};
