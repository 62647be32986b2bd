//! Binary entry point: load configuration, start logging, restore the stored
//! session and hand control to the Ratatui event loop.
use std::sync::Arc;

use anyhow::Context;
use library_catalog_tui::{
    ensure_schema, logging, run_app, App, ClientConfig, Gateway, HttpTransport, SessionStore,
    ThreadedRunner,
};
use tracing::info;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = ClientConfig::load()?;
    let _guard = logging::init(&config)?;

    let storage_path = config.storage_path()?;
    let conn = ensure_schema(&storage_path)?;
    let sessions = SessionStore::restore(conn);

    let transport =
        HttpTransport::new(config.request_timeout()).context("failed to build HTTP client")?;
    let runner = ThreadedRunner::new(Arc::new(transport));
    let gateway = Gateway::new(config.api.base_url.clone());
    info!(base_url = %gateway.base_url(), "starting library catalog client");

    let mut app = App::new(
        gateway,
        Box::new(runner),
        sessions,
        config.notice_duration(),
    );
    let result = run_app(&mut app);
    info!("library catalog client exited");
    result
}
