#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! `SQLite` persistence for RMM audit data.
//!
//! Uses `switchy_database` over `rusqlite` with raw SQL. Every device is
//! written inside its own transaction, so a failure part-way through a
//! device leaves no partial rows behind.

pub mod api;
pub mod audit;
pub mod db;
pub mod queries;
pub mod report;
pub mod schema;

use switchy_database::{DatabaseTransaction, DatabaseValue};

pub use api::insert_api_device;
pub use audit::insert_device_audit;
pub use db::{open_db, open_in_memory};
pub use queries::{
    count_devices, get_device, get_device_audits, get_device_by_uid, get_devices,
    get_stored_device, get_udfs,
};
pub use report::insert_report_device;
pub use schema::{create_tables, reset_schema};

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Database query error.
    #[error("Database error: {0}")]
    Database(#[from] switchy_database::DatabaseError),

    /// The database could not be opened.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A statement returned something other than what was expected.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },

    /// A value could not be serialized for storage.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An I/O operation failed (e.g., creating the database directory).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Converts an `Option<&str>` to a [`DatabaseValue`], using `Null` for `None`.
fn opt_str(value: Option<&str>) -> DatabaseValue {
    value.map_or(DatabaseValue::Null, |s| DatabaseValue::String(s.to_string()))
}

/// Converts an `Option<i64>` to a [`DatabaseValue`], using `Null` for `None`.
fn opt_i64(value: Option<i64>) -> DatabaseValue {
    value.map_or(DatabaseValue::Null, DatabaseValue::Int64)
}

fn text(value: &str) -> DatabaseValue {
    DatabaseValue::String(value.to_string())
}

/// Extracts the `id` column of the first row returned by a `RETURNING id`
/// clause or an id lookup.
fn first_id(rows: &[switchy_database::Row]) -> Option<i64> {
    use moosicbox_json_utils::database::ToValue as _;

    rows.first().and_then(|r| r.to_value("id").ok())
}

/// Commits `tx` if `result` is `Ok`, otherwise rolls it back and returns
/// the original error.
async fn finish<T>(
    tx: Box<dyn DatabaseTransaction>,
    result: Result<T, DbError>,
) -> Result<T, DbError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                log::error!("Rollback failed after '{e}': {rollback_err}");
            }
            Err(e)
        }
    }
}
