use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use rusqlite::Connection;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".library-catalog";
/// SQLite file name stored inside the application data directory.
const STORAGE_FILE_NAME: &str = "session.sqlite";

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS local_storage (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)";

/// Ensure the storage file exists, create the key/value table if needed, and
/// return a live connection.
pub fn ensure_schema(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create data directory")?;
    }

    let conn = Connection::open(path).context("failed to open session storage")?;
    conn.execute(CREATE_TABLE, [])
        .context("failed to create local_storage table")?;
    Ok(conn)
}

/// Throwaway storage that lives as long as the connection. Used by tests and
/// whenever nothing should outlive the process.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("failed to open in-memory storage")?;
    conn.execute(CREATE_TABLE, [])
        .context("failed to create local_storage table")?;
    Ok(conn)
}

/// Resolve the absolute path to the storage file inside the user's home.
pub fn default_storage_path() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs
        .home_dir()
        .join(DATA_DIR_NAME)
        .join(STORAGE_FILE_NAME))
}
