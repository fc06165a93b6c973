//! Database connection utilities.

use std::path::Path;

use switchy_database::Database;
use switchy_database_connection::init_sqlite_rusqlite;

use crate::{DbError, schema};

/// Opens (or creates) the `SQLite` database at `path` and ensures every
/// table exists.
///
/// # Errors
///
/// Returns [`DbError`] if the parent directory cannot be created, the
/// connection fails, or the schema DDL fails.
pub async fn open_db(path: &Path) -> Result<Box<dyn Database>, DbError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let db = init_sqlite_rusqlite(Some(path)).map_err(|e| DbError::Connection(e.to_string()))?;

    schema::create_tables(db.as_ref()).await?;

    log::debug!("Opened database at {}", path.display());
    Ok(db)
}

/// Opens a private in-memory database with every table created.
///
/// # Errors
///
/// Returns [`DbError`] if the connection or the schema DDL fails.
pub async fn open_in_memory() -> Result<Box<dyn Database>, DbError> {
    let db = init_sqlite_rusqlite(None).map_err(|e| DbError::Connection(e.to_string()))?;
    schema::create_tables(db.as_ref()).await?;
    Ok(db)
}
