use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

/// Read a stored value, `None` when the key was never written or was removed.
pub fn get_item(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM local_storage WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
    .with_context(|| format!("failed to read storage entry {key}"))
}

/// Insert or overwrite a value.
pub fn set_item(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO local_storage (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )
    .with_context(|| format!("failed to write storage entry {key}"))?;
    Ok(())
}

/// Remove a value. Removing a missing key is not an error.
pub fn remove_item(conn: &Connection, key: &str) -> Result<()> {
    conn.execute("DELETE FROM local_storage WHERE key = ?1", params![key])
        .with_context(|| format!("failed to remove storage entry {key}"))?;
    Ok(())
}
