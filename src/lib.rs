//! Core library surface for the library catalog terminal client.
//!
//! The binary only wires configuration, logging and storage together; the
//! controller, gateway and session handling live here so integration tests can
//! drive them without a terminal.
pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod notify;
pub mod router;
pub mod session;
pub mod storage;
pub mod ui;

pub use api::{Gateway, HttpTransport, ThreadedRunner};
pub use config::ClientConfig;
pub use models::{Book, BookStatus, RecordId, Role, User};
pub use router::View;
pub use session::{Session, SessionStore};
pub use storage::ensure_schema;
pub use ui::{run_app, App, Intent};
