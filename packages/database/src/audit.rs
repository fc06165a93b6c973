//! Persistence of per-device hardware audits.

use rmm_audit_api_models::DeviceAudit;
use rmm_audit_database_models::DeviceAuditRow;
use switchy_database::{Database, DatabaseValue};

use crate::{DbError, first_id, opt_i64, opt_str, text};

/// Flattens an API audit into its stored row shape.
///
/// Nested inventories become JSON arrays; processor and video adapter
/// names are joined with `", "`.
///
/// # Errors
///
/// Returns [`DbError::Serialization`] if an inventory cannot be rendered
/// as JSON.
pub fn audit_row(
    device_uid: &str,
    audit: &DeviceAudit,
    fetched_at: String,
) -> Result<DeviceAuditRow, DbError> {
    let system = audit.system_info.clone().unwrap_or_default();
    let bios = audit.bios.clone().unwrap_or_default();
    let board = audit.base_board.clone().unwrap_or_default();
    let snmp = audit.snmp_info.clone().unwrap_or_default();

    let joined = |names: Vec<&str>| {
        let names: Vec<&str> = names.into_iter().filter(|n| !n.is_empty()).collect();
        if names.is_empty() {
            None
        } else {
            Some(names.join(", "))
        }
    };

    Ok(DeviceAuditRow {
        device_uid: device_uid.to_string(),
        portal_url: audit.portal_url.clone(),
        web_remote_url: audit.web_remote_url.clone(),
        manufacturer: system.manufacturer,
        model: system.model,
        total_physical_memory: system.total_physical_memory,
        username: system.username,
        dotnet_version: system.dot_net_version,
        total_cpu_cores: system.total_cpu_cores,
        bios_serial: bios.serial_number,
        bios_release_date: bios.release_date,
        bios_version: bios.sm_bios_version,
        baseboard_manufacturer: board.manufacturer,
        baseboard_product: board.product,
        snmp_name: snmp.snmp_name,
        snmp_contact: snmp.snmp_contact,
        snmp_location: snmp.snmp_location,
        snmp_uptime: snmp.snmp_uptime,
        snmp_serial: snmp.snmp_serial,
        object_id: snmp.object_id,
        nic_summary: Some(serde_json::to_string(&audit.nics)?),
        display_summary: Some(serde_json::to_string(&audit.displays)?),
        disks_summary: Some(serde_json::to_string(&audit.logical_disks)?),
        processors: joined(audit.processors.iter().map(|p| p.name.as_str()).collect()),
        video_boards: joined(
            audit
                .video_boards
                .iter()
                .map(|v| v.display_adapter.as_str())
                .collect(),
        ),
        attached_devices: Some(serde_json::to_string(&audit.attached_devices)?),
        physical_memory: Some(serde_json::to_string(&audit.physical_memory)?),
        fetched_at,
    })
}

/// Stores the audit of the device with vendor UID `device_uid`.
///
/// Returns the new audit row id, or `None` if no device with that UID is
/// stored.
///
/// # Errors
///
/// Returns [`DbError`] if the lookup or insert fails.
pub async fn insert_device_audit(
    db: &dyn Database,
    device_uid: &str,
    audit: &DeviceAudit,
) -> Result<Option<i64>, DbError> {
    let rows = db
        .query_raw_params("SELECT id FROM devices WHERE uid = ?", &[text(device_uid)])
        .await?;

    let Some(device_id) = first_id(&rows) else {
        log::warn!("No stored device for UID {device_uid}; audit not saved");
        return Ok(None);
    };

    let row = audit_row(device_uid, audit, chrono::Utc::now().to_rfc3339())?;

    write_audit_row(db, device_id, &row).await.map(Some)
}

async fn write_audit_row(
    db: &dyn Database,
    device_id: i64,
    row: &DeviceAuditRow,
) -> Result<i64, DbError> {
    let rows = db
        .query_raw_params(
            "INSERT INTO device_audits (
                 device_id, device_uid, portal_url, web_remote_url,
                 manufacturer, model, total_physical_memory, username, dotnet_version,
                 total_cpu_cores, bios_serial, bios_release_date, bios_version,
                 baseboard_manufacturer, baseboard_product,
                 snmp_name, snmp_contact, snmp_location, snmp_uptime, snmp_serial, object_id,
                 nic_summary, display_summary, disks_summary,
                 processors, video_boards, attached_devices, physical_memory, fetched_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
            &[
                DatabaseValue::Int64(device_id),
                text(&row.device_uid),
                opt_str(row.portal_url.as_deref()),
                opt_str(row.web_remote_url.as_deref()),
                opt_str(row.manufacturer.as_deref()),
                opt_str(row.model.as_deref()),
                opt_i64(row.total_physical_memory),
                opt_str(row.username.as_deref()),
                opt_str(row.dotnet_version.as_deref()),
                opt_i64(row.total_cpu_cores),
                opt_str(row.bios_serial.as_deref()),
                opt_str(row.bios_release_date.as_deref()),
                opt_str(row.bios_version.as_deref()),
                opt_str(row.baseboard_manufacturer.as_deref()),
                opt_str(row.baseboard_product.as_deref()),
                opt_str(row.snmp_name.as_deref()),
                opt_str(row.snmp_contact.as_deref()),
                opt_str(row.snmp_location.as_deref()),
                opt_str(row.snmp_uptime.as_deref()),
                opt_str(row.snmp_serial.as_deref()),
                opt_str(row.object_id.as_deref()),
                opt_str(row.nic_summary.as_deref()),
                opt_str(row.display_summary.as_deref()),
                opt_str(row.disks_summary.as_deref()),
                opt_str(row.processors.as_deref()),
                opt_str(row.video_boards.as_deref()),
                opt_str(row.attached_devices.as_deref()),
                opt_str(row.physical_memory.as_deref()),
                text(&row.fetched_at),
            ],
        )
        .await?;

    first_id(&rows).ok_or_else(|| DbError::Conversion {
        message: format!("INSERT INTO device_audits returned no id for {}", row.device_uid),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::insert_api_device;
    use crate::queries::get_device_audits;
    use crate::test_utils::temp_db;

    fn sample_audit() -> DeviceAudit {
        serde_json::from_str(
            r#"{
                "portalUrl": "https://portal.example.com/device/1",
                "systemInfo": {
                    "manufacturer": "HP",
                    "model": "EliteBook 840",
                    "totalPhysicalMemory": 17179869184,
                    "totalCpuCores": 8
                },
                "bios": {"serialNumber": "5CD1234", "smBiosVersion": "3.2"},
                "nics": [{"instance": "Intel Ethernet", "macAddress": "00:11:22:33:44:55"}],
                "processors": [{"name": "Intel i7"}, {"name": ""}, {"name": "Intel i5"}],
                "videoBoards": [{"displayAdapter": "Intel UHD 620"}]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn flattens_audit_into_row() {
        let row = audit_row("abc-123", &sample_audit(), "2024-05-01T00:00:00Z".to_string())
            .unwrap();

        assert_eq!(row.manufacturer.as_deref(), Some("HP"));
        assert_eq!(row.total_physical_memory, Some(17_179_869_184));
        assert_eq!(row.bios_version.as_deref(), Some("3.2"));
        assert_eq!(row.processors.as_deref(), Some("Intel i7, Intel i5"));
        assert_eq!(row.video_boards.as_deref(), Some("Intel UHD 620"));
        assert_eq!(row.snmp_name, None);
        assert_eq!(row.display_summary.as_deref(), Some("[]"));
        assert!(row.nic_summary.unwrap().contains("00:11:22:33:44:55"));
    }

    #[tokio::test]
    async fn stores_audit_for_known_device() {
        let temp = temp_db().await;
        let db = temp.db.as_ref();

        let device: rmm_audit_api_models::ApiDevice =
            serde_json::from_str(r#"{"uid": "abc-123", "patchManagement": {}}"#).unwrap();
        let device_id = insert_api_device(db, &device).await.unwrap().unwrap();

        let audit_id = insert_device_audit(db, "abc-123", &sample_audit())
            .await
            .unwrap();
        assert!(audit_id.is_some());

        let audits = get_device_audits(db, device_id).await.unwrap();
        assert_eq!(audits.len(), 1);
        assert_eq!(audits[0].device_uid, "abc-123");
        assert_eq!(audits[0].model.as_deref(), Some("EliteBook 840"));
        assert_eq!(audits[0].total_cpu_cores, Some(8));
        assert!(!audits[0].fetched_at.is_empty());
    }

    #[tokio::test]
    async fn audit_finds_device_stored_with_padded_uid() {
        let temp = temp_db().await;
        let db = temp.db.as_ref();

        let device: rmm_audit_api_models::ApiDevice =
            serde_json::from_str(r#"{"uid": "  abc-123 ", "patchManagement": {}}"#).unwrap();
        insert_api_device(db, &device).await.unwrap().unwrap();

        let uid = device.device_uid().unwrap();
        assert!(
            insert_device_audit(db, uid, &sample_audit())
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn audit_for_unknown_device_is_skipped() {
        let temp = temp_db().await;
        assert_eq!(
            insert_device_audit(temp.db.as_ref(), "missing", &sample_audit())
                .await
                .unwrap(),
            None
        );
    }
}
