//! Persistence of devices fetched from the RMM API.
//!
//! Devices are keyed by their vendor UID. Storing a UID that already
//! exists updates the device row in place and replaces its dependent rows,
//! so re-ingesting a site never duplicates data.

use rmm_audit_api_models::ApiDevice;
use switchy_database::{Database, DatabaseValue};

use crate::{DbError, finish, first_id, opt_i64, opt_str, text};

/// Tables rewritten on every API upsert.
const API_DEPENDENT_TABLES: &[&str] = &[
    "software",
    "patch_management",
    "monitoring",
    "lifecycle",
    "udfs",
];

/// UDF values the vendor uses as placeholders for "unset".
const PLACEHOLDER_UDF_VALUES: &[&str] = &["string", "null"];

/// Whether a UDF value carries information worth storing.
///
/// Empty values and the placeholders `"string"` and `"null"` (any case,
/// surrounding whitespace ignored) are rejected.
#[must_use]
pub fn should_store_udf(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty()
        && !PLACEHOLDER_UDF_VALUES
            .iter()
            .any(|placeholder| value.eq_ignore_ascii_case(placeholder))
}

/// Renders a UDF JSON value as stored text, or `None` for JSON `null`.
/// Strings are kept exactly as sent.
#[must_use]
pub fn udf_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// The UDF pairs of `device` that pass [`should_store_udf`], in key order.
#[must_use]
pub fn storable_udfs(device: &ApiDevice) -> Vec<(&str, String)> {
    device
        .udf
        .iter()
        .filter_map(|(key, value)| {
            udf_text(value)
                .filter(|text| should_store_udf(text))
                .map(|text| (key.as_str(), text))
        })
        .collect()
}

/// Upserts one API device by UID and rewrites its software, patch,
/// monitoring, lifecycle, and UDF rows.
///
/// Returns the device's `devices.id`, or `None` when the device was
/// skipped because it has no UID or its row could not be found after the
/// upsert.
///
/// # Errors
///
/// Returns [`DbError`] if any statement fails; nothing is written for
/// this device in that case.
pub async fn insert_api_device(db: &dyn Database, device: &ApiDevice) -> Result<Option<i64>, DbError> {
    let Some(uid) = device.device_uid() else {
        log::warn!(
            "Skipping API device without a UID (hostname: {})",
            device.hostname.as_deref().unwrap_or("<unknown>")
        );
        return Ok(None);
    };

    let tx = db.begin_transaction().await?;
    let result = write_api_device(tx.as_ref(), uid, device).await;
    finish(tx, result).await
}

async fn write_api_device(
    db: &dyn Database,
    uid: &str,
    device: &ApiDevice,
) -> Result<Option<i64>, DbError> {
    db.exec_raw_params(
        "INSERT INTO devices (uid, name, description, last_user, domain, os_version,
             serial_number, last_reboot)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT (uid) DO UPDATE SET
             name = excluded.name,
             description = excluded.description,
             last_user = excluded.last_user,
             domain = excluded.domain,
             os_version = excluded.os_version,
             serial_number = excluded.serial_number,
             last_reboot = excluded.last_reboot",
        &[
            text(uid),
            opt_str(device.hostname.as_deref()),
            opt_str(device.description.as_deref()),
            opt_str(device.last_logged_in_user.as_deref()),
            opt_str(device.domain.as_deref()),
            opt_str(device.operating_system.as_deref()),
            opt_str(device.serial_number.as_deref()),
            opt_str(device.last_reboot_text().as_deref()),
        ],
    )
    .await?;

    let rows = db
        .query_raw_params("SELECT id FROM devices WHERE uid = ?", &[text(uid)])
        .await?;

    let Some(device_id) = first_id(&rows) else {
        log::warn!("Failed to fetch device id for UID {uid}; skipping");
        return Ok(None);
    };
    let id = DatabaseValue::Int64(device_id);

    for table in API_DEPENDENT_TABLES {
        db.exec_raw_params(
            &format!("DELETE FROM {table} WHERE device_id = ?"),
            &[id.clone()],
        )
        .await?;
    }

    db.exec_raw_params(
        "INSERT INTO software (device_id, antivirus, software_status) VALUES (?, ?, ?)",
        &[
            id.clone(),
            opt_str(device.antivirus_product()),
            opt_str(device.software_status.as_deref()),
        ],
    )
    .await?;

    let patch = &device.patch_management;
    db.exec_raw_params(
        "INSERT INTO patch_management (device_id, patch_status, patches_approved_pending,
             patches_not_approved, patches_installed)
         VALUES (?, ?, ?, ?, ?)",
        &[
            id.clone(),
            opt_str(patch.patch_status.as_deref()),
            opt_i64(patch.patches_approved_pending),
            opt_i64(patch.patches_not_approved),
            opt_i64(patch.patches_installed),
        ],
    )
    .await?;

    db.exec_raw_params(
        "INSERT INTO monitoring (device_id, network_ext_ip, network_int_ip) VALUES (?, ?, ?)",
        &[
            id.clone(),
            opt_str(device.ext_ip_address.as_deref()),
            opt_str(device.int_ip_address.as_deref()),
        ],
    )
    .await?;

    db.exec_raw_params(
        "INSERT INTO lifecycle (device_id, warranty_date) VALUES (?, ?)",
        &[id.clone(), opt_str(device.warranty_date.as_deref())],
    )
    .await?;

    let udfs = storable_udfs(device);
    for (key, value) in &udfs {
        db.exec_raw_params(
            "INSERT INTO udfs (device_id, key, value) VALUES (?, ?, ?)",
            &[id.clone(), text(key), DatabaseValue::String(value.clone())],
        )
        .await?;
    }

    log::debug!(
        "Stored API device {uid} as id {device_id} ({} of {} UDF(s))",
        udfs.len(),
        device.udf.len()
    );

    Ok(Some(device_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::{count_devices, get_device_by_uid, get_stored_device, get_udfs};
    use crate::test_utils::temp_db;

    fn device(json: &str) -> ApiDevice {
        serde_json::from_str(json).unwrap()
    }

    fn sample_device() -> ApiDevice {
        device(
            r#"{
                "uid": "abc-123",
                "hostname": "WS-01",
                "description": "Reception PC",
                "lastLoggedInUser": "CORP\\jdoe",
                "domain": "CORP",
                "operatingSystem": "Microsoft Windows 11 Pro",
                "serialNumber": "5CD1234",
                "antivirus": {"antivirusProduct": "Defender"},
                "softwareStatus": "Compliant",
                "patchManagement": {
                    "patchStatus": "FullyPatched",
                    "patchesApprovedPending": 0,
                    "patchesNotApproved": 2,
                    "patchesInstalled": 120
                },
                "extIpAddress": "203.0.113.7",
                "intIpAddress": "10.0.0.12",
                "warrantyDate": "2026-01-01",
                "udf": {
                    "udf1": "Front desk",
                    "udf2": null,
                    "udf3": "string",
                    "udf4": " NULL ",
                    "udf5": "",
                    "udf6": 42
                }
            }"#,
        )
    }

    #[test]
    fn udf_filter_rejects_placeholders_and_empty_values() {
        for rejected in ["", "   ", "string", "STRING", "null", " Null "] {
            assert!(!should_store_udf(rejected), "{rejected:?} should be skipped");
        }
        for kept in ["Front desk", "0", "nullable", "strings"] {
            assert!(should_store_udf(kept), "{kept:?} should be stored");
        }
    }

    #[test]
    fn storable_udfs_keeps_meaningful_pairs_in_key_order() {
        let device = sample_device();
        assert_eq!(
            storable_udfs(&device),
            vec![("udf1", "Front desk".to_string()), ("udf6", "42".to_string())]
        );
    }

    #[tokio::test]
    async fn api_device_round_trips() {
        let temp = temp_db().await;
        let db = temp.db.as_ref();

        let id = insert_api_device(db, &sample_device()).await.unwrap().unwrap();
        let stored = get_stored_device(db, id).await.unwrap().unwrap();

        assert_eq!(stored.device.uid.as_deref(), Some("abc-123"));
        assert_eq!(stored.device.name.as_deref(), Some("WS-01"));
        assert_eq!(stored.device.last_user.as_deref(), Some("CORP\\jdoe"));
        assert_eq!(
            stored.device.os_version.as_deref(),
            Some("Microsoft Windows 11 Pro")
        );

        let software = stored.software.unwrap();
        assert_eq!(software.antivirus.as_deref(), Some("Defender"));
        assert_eq!(software.software_status.as_deref(), Some("Compliant"));

        let patch = stored.patch_management.unwrap();
        assert_eq!(patch.patch_status.as_deref(), Some("FullyPatched"));
        assert_eq!(patch.patches_approved_pending, Some(0));
        assert_eq!(patch.patches_not_approved, Some(2));
        assert_eq!(patch.patches_installed, Some(120));

        let monitoring = stored.monitoring.unwrap();
        assert_eq!(monitoring.network_ext_ip.as_deref(), Some("203.0.113.7"));
        assert_eq!(monitoring.mac_address, None);
        assert_eq!(
            stored.lifecycle.unwrap().warranty_date.as_deref(),
            Some("2026-01-01")
        );

        let keys: Vec<&str> = stored.udfs.iter().map(|u| u.key.as_str()).collect();
        assert_eq!(keys, vec!["udf1", "udf6"]);
        assert!(stored.hardware.is_none());
    }

    #[tokio::test]
    async fn reingesting_a_uid_updates_in_place() {
        let temp = temp_db().await;
        let db = temp.db.as_ref();

        let first = insert_api_device(db, &sample_device()).await.unwrap().unwrap();

        let mut renamed = sample_device();
        renamed.hostname = Some("WS-01-NEW".to_string());
        renamed.udf.clear();
        let second = insert_api_device(db, &renamed).await.unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(count_devices(db).await.unwrap(), 1);

        let device = get_device_by_uid(db, "abc-123").await.unwrap().unwrap();
        assert_eq!(device.name.as_deref(), Some("WS-01-NEW"));
        assert!(get_udfs(db, first).await.unwrap().is_empty());

        let stored = get_stored_device(db, first).await.unwrap().unwrap();
        assert!(stored.software.is_some());
    }

    #[tokio::test]
    async fn stored_values_match_the_payload() {
        let temp = temp_db().await;
        let db = temp.db.as_ref();

        let device = device(
            r#"{
                "uid": "epoch-1",
                "lastSeen": 1700000000000,
                "lastReboot": 1699990000000,
                "serialNumber": "20240301",
                "patchManagement": {},
                "udf": {"udf1": "  Lobby  ", "udf2": "  string "}
            }"#,
        );

        let id = insert_api_device(db, &device).await.unwrap().unwrap();
        let stored = get_stored_device(db, id).await.unwrap().unwrap();

        assert_eq!(stored.device.last_reboot.as_deref(), Some("1699990000000"));
        assert_eq!(stored.device.serial_number.as_deref(), Some("20240301"));

        let udfs: Vec<(&str, &str)> = stored
            .udfs
            .iter()
            .map(|u| (u.key.as_str(), u.value.as_str()))
            .collect();
        assert_eq!(udfs, vec![("udf1", "  Lobby  ")]);
    }

    #[tokio::test]
    async fn device_without_uid_is_skipped() {
        let temp = temp_db().await;
        let db = temp.db.as_ref();

        let mut no_uid = sample_device();
        no_uid.uid = None;
        assert_eq!(insert_api_device(db, &no_uid).await.unwrap(), None);

        let mut blank_uid = sample_device();
        blank_uid.uid = Some("  ".to_string());
        assert_eq!(insert_api_device(db, &blank_uid).await.unwrap(), None);

        assert_eq!(count_devices(db).await.unwrap(), 0);
    }
}
