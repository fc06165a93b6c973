//! Persistence of devices extracted from audit reports.

use rmm_audit_report_models::DeviceRecord;
use switchy_database::{Database, DatabaseValue};

use crate::{DbError, finish, first_id, text};

/// Inserts one extracted device and its hardware, software, monitoring,
/// lifecycle, and storage rows. Report devices have no vendor UID, so
/// every call creates a new device.
///
/// Returns the new `devices.id`.
///
/// # Errors
///
/// Returns [`DbError`] if any insert fails; nothing is written in that
/// case.
pub async fn insert_report_device(db: &dyn Database, record: &DeviceRecord) -> Result<i64, DbError> {
    let tx = db.begin_transaction().await?;
    let result = write_report_device(tx.as_ref(), record).await;
    finish(tx, result).await
}

async fn write_report_device(db: &dyn Database, record: &DeviceRecord) -> Result<i64, DbError> {
    let device = &record.device;
    let rows = db
        .query_raw_params(
            "INSERT INTO devices (name, description, last_user, domain, serial_number,
                 os_version, architecture, windows_key, last_reboot)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
            &[
                text(&device.device_name),
                text(&device.description),
                text(&device.last_user),
                text(&device.domain),
                text(&device.serial_number),
                text(&device.os_version),
                text(&device.architecture),
                text(&device.windows_key),
                text(&device.last_reboot),
            ],
        )
        .await?;

    let device_id = first_id(&rows).ok_or_else(|| DbError::Conversion {
        message: format!(
            "INSERT INTO devices returned no id for '{}'",
            device.device_name
        ),
    })?;
    let id = DatabaseValue::Int64(device_id);

    let hardware = &record.hardware;
    db.exec_raw_params(
        "INSERT INTO hardware (device_id, processor, ram, motherboard, bios_version, display_adapter)
         VALUES (?, ?, ?, ?, ?, ?)",
        &[
            id.clone(),
            text(&hardware.cpu),
            text(&hardware.ram),
            text(&hardware.motherboard),
            text(&hardware.bios_version),
            text(&hardware.display_adapter),
        ],
    )
    .await?;

    for entry in &record.storage {
        db.exec_raw_params(
            "INSERT INTO storage (device_id, drive_letter, disk_description, disk_size,
                 disk_used, disk_usage_percent)
             VALUES (?, ?, ?, ?, ?, ?)",
            &[
                id.clone(),
                text(&entry.drive_letter),
                text(&entry.disk_description),
                text(&entry.disk_size),
                text(&entry.disk_used),
                text(&entry.disk_usage_percent),
            ],
        )
        .await?;
    }

    let software = &record.software;
    db.exec_raw_params(
        "INSERT INTO software (device_id, office_key, antivirus, bitlocker_status)
         VALUES (?, ?, ?, ?)",
        &[
            id.clone(),
            text(&software.office_key),
            text(&software.antivirus),
            text(&software.bitlocker_status),
        ],
    )
    .await?;

    let monitoring = &record.monitoring;
    db.exec_raw_params(
        "INSERT INTO monitoring (device_id, network_ext_ip, network_int_ip, mac_address)
         VALUES (?, ?, ?, ?)",
        &[
            id.clone(),
            text(&monitoring.network_ext_ip),
            text(&monitoring.network_int_ip),
            text(&monitoring.mac_address),
        ],
    )
    .await?;

    let lifecycle = &record.lifecycle;
    db.exec_raw_params(
        "INSERT INTO lifecycle (device_id, purchase_date, warranty_date, warranty_status)
         VALUES (?, ?, ?, ?)",
        &[
            id,
            text(&lifecycle.purchase_date),
            text(&lifecycle.warranty_date),
            text(&lifecycle.warranty_status),
        ],
    )
    .await?;

    log::debug!(
        "Stored report device '{}' as id {device_id} ({} storage row(s))",
        device.device_name,
        record.storage.len()
    );

    Ok(device_id)
}
