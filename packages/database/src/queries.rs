//! Read-back queries over stored devices.

use moosicbox_json_utils::database::ToValue as _;
use rmm_audit_database_models::{
    DeviceAuditRow, DeviceRow, HardwareRow, LifecycleRow, MonitoringRow, PatchManagementRow,
    SoftwareRow, StorageRow, StoredDevice, UdfRow,
};
use switchy_database::{Database, DatabaseValue, Row};

use crate::{DbError, text};

/// Reads a nullable text column. A value of any other type is an error
/// rather than `None`, so a lossy column never reads back as missing.
fn opt(row: &Row, col: &str) -> Result<Option<String>, DbError> {
    row.to_value::<Option<String>>(col).map_err(|e| conversion(col, &e))
}

fn opt_int(row: &Row, col: &str) -> Result<Option<i64>, DbError> {
    row.to_value::<Option<i64>>(col).map_err(|e| conversion(col, &e))
}

fn text_col(row: &Row, col: &str) -> Result<String, DbError> {
    row.to_value::<String>(col).map_err(|e| conversion(col, &e))
}

fn conversion(col: &str, error: &impl std::fmt::Display) -> DbError {
    DbError::Conversion {
        message: format!("Failed to read column '{col}': {error}"),
    }
}

fn row_to_device(row: &Row) -> Result<DeviceRow, DbError> {
    Ok(DeviceRow {
        id: row.to_value::<i64>("id").map_err(|e| conversion("id", &e))?,
        uid: opt(row, "uid")?,
        name: opt(row, "name")?,
        description: opt(row, "description")?,
        last_user: opt(row, "last_user")?,
        domain: opt(row, "domain")?,
        serial_number: opt(row, "serial_number")?,
        os_version: opt(row, "os_version")?,
        architecture: opt(row, "architecture")?,
        windows_key: opt(row, "windows_key")?,
        last_reboot: opt(row, "last_reboot")?,
    })
}

fn row_to_hardware(row: &Row) -> Result<HardwareRow, DbError> {
    Ok(HardwareRow {
        processor: opt(row, "processor")?,
        ram: opt(row, "ram")?,
        motherboard: opt(row, "motherboard")?,
        bios_version: opt(row, "bios_version")?,
        display_adapter: opt(row, "display_adapter")?,
        build_date: opt(row, "build_date")?,
    })
}

fn row_to_storage(row: &Row) -> Result<StorageRow, DbError> {
    Ok(StorageRow {
        drive_letter: opt(row, "drive_letter")?,
        disk_description: opt(row, "disk_description")?,
        disk_size: opt(row, "disk_size")?,
        disk_used: opt(row, "disk_used")?,
        disk_usage_percent: opt(row, "disk_usage_percent")?,
    })
}

fn row_to_software(row: &Row) -> Result<SoftwareRow, DbError> {
    Ok(SoftwareRow {
        office_key: opt(row, "office_key")?,
        antivirus: opt(row, "antivirus")?,
        bitlocker_status: opt(row, "bitlocker_status")?,
        software_status: opt(row, "software_status")?,
    })
}

fn row_to_monitoring(row: &Row) -> Result<MonitoringRow, DbError> {
    Ok(MonitoringRow {
        network_ext_ip: opt(row, "network_ext_ip")?,
        network_int_ip: opt(row, "network_int_ip")?,
        mac_address: opt(row, "mac_address")?,
    })
}

fn row_to_patch_management(row: &Row) -> Result<PatchManagementRow, DbError> {
    Ok(PatchManagementRow {
        patch_status: opt(row, "patch_status")?,
        patches_approved_pending: opt_int(row, "patches_approved_pending")?,
        patches_not_approved: opt_int(row, "patches_not_approved")?,
        patches_installed: opt_int(row, "patches_installed")?,
    })
}

fn row_to_lifecycle(row: &Row) -> Result<LifecycleRow, DbError> {
    Ok(LifecycleRow {
        purchase_date: opt(row, "purchase_date")?,
        warranty_date: opt(row, "warranty_date")?,
        warranty_status: opt(row, "warranty_status")?,
    })
}

fn row_to_udf(row: &Row) -> Result<UdfRow, DbError> {
    Ok(UdfRow {
        key: text_col(row, "key")?,
        value: opt(row, "value")?.unwrap_or_default(),
    })
}

fn row_to_audit(row: &Row) -> Result<DeviceAuditRow, DbError> {
    Ok(DeviceAuditRow {
        device_uid: text_col(row, "device_uid")?,
        portal_url: opt(row, "portal_url")?,
        web_remote_url: opt(row, "web_remote_url")?,
        manufacturer: opt(row, "manufacturer")?,
        model: opt(row, "model")?,
        total_physical_memory: opt_int(row, "total_physical_memory")?,
        username: opt(row, "username")?,
        dotnet_version: opt(row, "dotnet_version")?,
        total_cpu_cores: opt_int(row, "total_cpu_cores")?,
        bios_serial: opt(row, "bios_serial")?,
        bios_release_date: opt(row, "bios_release_date")?,
        bios_version: opt(row, "bios_version")?,
        baseboard_manufacturer: opt(row, "baseboard_manufacturer")?,
        baseboard_product: opt(row, "baseboard_product")?,
        snmp_name: opt(row, "snmp_name")?,
        snmp_contact: opt(row, "snmp_contact")?,
        snmp_location: opt(row, "snmp_location")?,
        snmp_uptime: opt(row, "snmp_uptime")?,
        snmp_serial: opt(row, "snmp_serial")?,
        object_id: opt(row, "object_id")?,
        nic_summary: opt(row, "nic_summary")?,
        display_summary: opt(row, "display_summary")?,
        disks_summary: opt(row, "disks_summary")?,
        processors: opt(row, "processors")?,
        video_boards: opt(row, "video_boards")?,
        attached_devices: opt(row, "attached_devices")?,
        physical_memory: opt(row, "physical_memory")?,
        fetched_at: text_col(row, "fetched_at")?,
    })
}

/// Selects every row of `table` belonging to `device_id`, in insertion
/// order.
async fn dependent_rows(db: &dyn Database, table: &str, device_id: i64) -> Result<Vec<Row>, DbError> {
    Ok(db
        .query_raw_params(
            &format!("SELECT * FROM {table} WHERE device_id = ? ORDER BY id"),
            &[DatabaseValue::Int64(device_id)],
        )
        .await?)
}

/// Returns every stored device, ordered by id.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn get_devices(db: &dyn Database) -> Result<Vec<DeviceRow>, DbError> {
    let rows = db
        .query_raw_params("SELECT * FROM devices ORDER BY id", &[])
        .await?;
    rows.iter().map(row_to_device).collect()
}

/// Retrieves a single device by id.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn get_device(db: &dyn Database, id: i64) -> Result<Option<DeviceRow>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT * FROM devices WHERE id = ?",
            &[DatabaseValue::Int64(id)],
        )
        .await?;
    rows.first().map(row_to_device).transpose()
}

/// Retrieves a single device by vendor UID.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn get_device_by_uid(db: &dyn Database, uid: &str) -> Result<Option<DeviceRow>, DbError> {
    let rows = db
        .query_raw_params("SELECT * FROM devices WHERE uid = ?", &[text(uid)])
        .await?;
    rows.first().map(row_to_device).transpose()
}

/// Returns the stored UDFs of a device, ordered by key.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn get_udfs(db: &dyn Database, device_id: i64) -> Result<Vec<UdfRow>, DbError> {
    let rows = db
        .query_raw_params(
            "SELECT key, value FROM udfs WHERE device_id = ? ORDER BY key, id",
            &[DatabaseValue::Int64(device_id)],
        )
        .await?;
    rows.iter().map(row_to_udf).collect()
}

/// Returns the stored audits of a device, oldest first.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub async fn get_device_audits(
    db: &dyn Database,
    device_id: i64,
) -> Result<Vec<DeviceAuditRow>, DbError> {
    let rows = dependent_rows(db, "device_audits", device_id).await?;
    rows.iter().map(row_to_audit).collect()
}

/// Counts stored devices.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails or the count cannot be read.
pub async fn count_devices(db: &dyn Database) -> Result<i64, DbError> {
    let rows = db
        .query_raw_params("SELECT COUNT(*) AS count FROM devices", &[])
        .await?;

    let row = rows.first().ok_or_else(|| DbError::Conversion {
        message: "COUNT query returned no rows".to_string(),
    })?;

    row.to_value("count").map_err(|e| DbError::Conversion {
        message: format!("Failed to parse device count: {e}"),
    })
}

/// Loads a device together with all of its dependent rows.
///
/// Single-row sections are `None` when no row exists; if several exist
/// the first inserted one is returned.
///
/// # Errors
///
/// Returns [`DbError`] if any query fails.
pub async fn get_stored_device(db: &dyn Database, id: i64) -> Result<Option<StoredDevice>, DbError> {
    let Some(device) = get_device(db, id).await? else {
        return Ok(None);
    };

    let hardware = dependent_rows(db, "hardware", id).await?;
    let storage = dependent_rows(db, "storage", id).await?;
    let software = dependent_rows(db, "software", id).await?;
    let monitoring = dependent_rows(db, "monitoring", id).await?;
    let patch_management = dependent_rows(db, "patch_management", id).await?;
    let lifecycle = dependent_rows(db, "lifecycle", id).await?;

    Ok(Some(StoredDevice {
        device,
        hardware: hardware.first().map(row_to_hardware).transpose()?,
        storage: storage.iter().map(row_to_storage).collect::<Result<_, _>>()?,
        software: software.first().map(row_to_software).transpose()?,
        monitoring: monitoring.first().map(row_to_monitoring).transpose()?,
        patch_management: patch_management.first().map(row_to_patch_management).transpose()?,
        lifecycle: lifecycle.first().map(row_to_lifecycle).transpose()?,
        udfs: get_udfs(db, id).await?,
        audits: get_device_audits(db, id).await?,
    }))
}
