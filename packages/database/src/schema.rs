//! Table definitions and schema reset.
//!
//! `devices.id` is the surrogate key every dependent table references.
//! `devices.uid` carries the vendor identity for API devices and is `NULL`
//! for devices read from reports; `SQLite` allows any number of `NULL`s in a
//! `UNIQUE` column.
//!
//! Extracted attributes are strings, so their columns use text affinity;
//! a date-typed column would coerce values such as `"20240301"` to
//! integers.

use switchy_database::Database;

use crate::DbError;

/// `CREATE TABLE` statements in dependency order.
const CREATE_TABLES: &[(&str, &str)] = &[
    (
        "devices",
        "CREATE TABLE IF NOT EXISTS devices (
            id INTEGER PRIMARY KEY,
            uid TEXT UNIQUE,
            name VARCHAR,
            description TEXT,
            last_user VARCHAR,
            domain VARCHAR,
            serial_number VARCHAR,
            os_version VARCHAR,
            architecture VARCHAR,
            windows_key VARCHAR,
            last_reboot VARCHAR
        )",
    ),
    (
        "hardware",
        "CREATE TABLE IF NOT EXISTS hardware (
            id INTEGER PRIMARY KEY,
            device_id INTEGER NOT NULL REFERENCES devices(id),
            processor VARCHAR,
            ram VARCHAR,
            motherboard VARCHAR,
            bios_version VARCHAR,
            display_adapter VARCHAR,
            build_date VARCHAR
        )",
    ),
    (
        "storage",
        "CREATE TABLE IF NOT EXISTS storage (
            id INTEGER PRIMARY KEY,
            device_id INTEGER NOT NULL REFERENCES devices(id),
            drive_letter VARCHAR,
            disk_description VARCHAR,
            disk_size VARCHAR,
            disk_used VARCHAR,
            disk_usage_percent VARCHAR
        )",
    ),
    (
        "software",
        "CREATE TABLE IF NOT EXISTS software (
            id INTEGER PRIMARY KEY,
            device_id INTEGER NOT NULL REFERENCES devices(id),
            office_key VARCHAR,
            antivirus VARCHAR,
            bitlocker_status VARCHAR,
            software_status VARCHAR
        )",
    ),
    (
        "monitoring",
        "CREATE TABLE IF NOT EXISTS monitoring (
            id INTEGER PRIMARY KEY,
            device_id INTEGER NOT NULL REFERENCES devices(id),
            network_ext_ip VARCHAR,
            network_int_ip VARCHAR,
            mac_address VARCHAR
        )",
    ),
    (
        "security_events",
        "CREATE TABLE IF NOT EXISTS security_events (
            id INTEGER PRIMARY KEY,
            device_id INTEGER NOT NULL REFERENCES devices(id),
            firewall_enabled VARCHAR,
            defender_active VARCHAR,
            last_scan VARCHAR
        )",
    ),
    (
        "backups",
        "CREATE TABLE IF NOT EXISTS backups (
            id INTEGER PRIMARY KEY,
            device_id INTEGER NOT NULL REFERENCES devices(id),
            backup_status VARCHAR,
            last_backup VARCHAR,
            restore_events INTEGER
        )",
    ),
    (
        "device_health",
        "CREATE TABLE IF NOT EXISTS device_health (
            id INTEGER PRIMARY KEY,
            device_id INTEGER NOT NULL REFERENCES devices(id),
            status VARCHAR,
            issues TEXT
        )",
    ),
    (
        "patch_management",
        "CREATE TABLE IF NOT EXISTS patch_management (
            id INTEGER PRIMARY KEY,
            device_id INTEGER NOT NULL REFERENCES devices(id),
            patch_status VARCHAR,
            patches_approved_pending INTEGER,
            patches_not_approved INTEGER,
            patches_installed INTEGER
        )",
    ),
    (
        "lifecycle",
        "CREATE TABLE IF NOT EXISTS lifecycle (
            id INTEGER PRIMARY KEY,
            device_id INTEGER NOT NULL REFERENCES devices(id),
            purchase_date VARCHAR,
            warranty_date VARCHAR,
            warranty_status VARCHAR
        )",
    ),
    (
        "udfs",
        "CREATE TABLE IF NOT EXISTS udfs (
            id INTEGER PRIMARY KEY,
            device_id INTEGER NOT NULL REFERENCES devices(id),
            key TEXT NOT NULL,
            value TEXT
        )",
    ),
    (
        "device_audits",
        "CREATE TABLE IF NOT EXISTS device_audits (
            id INTEGER PRIMARY KEY,
            device_id INTEGER NOT NULL REFERENCES devices(id),
            device_uid TEXT NOT NULL,
            portal_url TEXT,
            web_remote_url TEXT,
            manufacturer TEXT,
            model TEXT,
            total_physical_memory INTEGER,
            username TEXT,
            dotnet_version TEXT,
            total_cpu_cores INTEGER,
            bios_serial TEXT,
            bios_release_date TEXT,
            bios_version TEXT,
            baseboard_manufacturer TEXT,
            baseboard_product TEXT,
            snmp_name TEXT,
            snmp_contact TEXT,
            snmp_location TEXT,
            snmp_uptime TEXT,
            snmp_serial TEXT,
            object_id TEXT,
            nic_summary TEXT,
            display_summary TEXT,
            disks_summary TEXT,
            processors TEXT,
            video_boards TEXT,
            attached_devices TEXT,
            physical_memory TEXT,
            fetched_at TEXT NOT NULL
        )",
    ),
];

/// Tables keyed by `device_id` that get a lookup index.
const INDEXED_TABLES: &[&str] = &[
    "hardware",
    "storage",
    "software",
    "monitoring",
    "patch_management",
    "lifecycle",
    "udfs",
    "device_audits",
];

/// Names of every managed table, in creation order.
#[must_use]
pub fn table_names() -> Vec<&'static str> {
    CREATE_TABLES.iter().map(|(name, _)| *name).collect()
}

/// Creates every table and index that does not exist yet.
///
/// # Errors
///
/// Returns [`DbError`] if any DDL statement fails.
pub async fn create_tables(db: &dyn Database) -> Result<(), DbError> {
    for (name, ddl) in CREATE_TABLES {
        log::trace!("Ensuring table {name}");
        db.exec_raw(ddl).await?;
    }

    for table in INDEXED_TABLES {
        db.exec_raw(&format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_device_id ON {table} (device_id)"
        ))
        .await?;
    }

    Ok(())
}

/// Drops every table, dependents first.
///
/// # Errors
///
/// Returns [`DbError`] if any `DROP TABLE` fails.
pub async fn drop_tables(db: &dyn Database) -> Result<(), DbError> {
    for (name, _) in CREATE_TABLES.iter().rev() {
        db.exec_raw(&format!("DROP TABLE IF EXISTS {name}")).await?;
    }
    Ok(())
}

/// Drops and recreates every table, leaving an empty database.
///
/// # Errors
///
/// Returns [`DbError`] if dropping or recreating fails.
pub async fn reset_schema(db: &dyn Database) -> Result<(), DbError> {
    drop_tables(db).await?;
    create_tables(db).await?;
    log::info!("Database schema reset ({} tables)", CREATE_TABLES.len());
    Ok(())
}
