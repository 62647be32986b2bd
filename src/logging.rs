//! Tracing setup. The terminal belongs to the UI, so events go to a daily
//! rolling file instead of stdout.

use std::fs;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ClientConfig;

const LOG_FILE_PREFIX: &str = "library-catalog.log";

/// Install the global subscriber. `RUST_LOG` wins over `logging.level`. Keep
/// the returned guard alive for the life of the process so buffered lines are
/// flushed on exit.
pub fn init(config: &ClientConfig) -> Result<WorkerGuard> {
    let directory = config.log_directory()?;
    fs::create_dir_all(&directory).context("failed to create log directory")?;

    let appender = tracing_appender::rolling::daily(&directory, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("library_catalog_tui={}", config.logging.level).into()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(guard)
}
