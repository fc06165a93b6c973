#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Row types for the RMM audit `SQLite` database.
//!
//! These mirror the stored columns rather than the extraction types in
//! `rmm_audit_report_models`: every text column is nullable because the API
//! path only fills the columns the vendor reports.

use serde::{Deserialize, Serialize};

/// A row of the `devices` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRow {
    /// Surrogate key referenced by every dependent table.
    pub id: i64,
    /// Vendor UID; `None` for devices read from a report.
    pub uid: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub last_user: Option<String>,
    pub domain: Option<String>,
    pub serial_number: Option<String>,
    pub os_version: Option<String>,
    pub architecture: Option<String>,
    pub windows_key: Option<String>,
    pub last_reboot: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareRow {
    pub processor: Option<String>,
    pub ram: Option<String>,
    pub motherboard: Option<String>,
    pub bios_version: Option<String>,
    pub display_adapter: Option<String>,
    pub build_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageRow {
    pub drive_letter: Option<String>,
    pub disk_description: Option<String>,
    pub disk_size: Option<String>,
    pub disk_used: Option<String>,
    pub disk_usage_percent: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftwareRow {
    pub office_key: Option<String>,
    pub antivirus: Option<String>,
    pub bitlocker_status: Option<String>,
    pub software_status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringRow {
    pub network_ext_ip: Option<String>,
    pub network_int_ip: Option<String>,
    pub mac_address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchManagementRow {
    pub patch_status: Option<String>,
    pub patches_approved_pending: Option<i64>,
    pub patches_not_approved: Option<i64>,
    pub patches_installed: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleRow {
    pub purchase_date: Option<String>,
    pub warranty_date: Option<String>,
    pub warranty_status: Option<String>,
}

/// One user-defined field of a device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UdfRow {
    pub key: String,
    pub value: String,
}

/// A stored hardware audit of one device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceAuditRow {
    pub device_uid: String,
    pub portal_url: Option<String>,
    pub web_remote_url: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub total_physical_memory: Option<i64>,
    pub username: Option<String>,
    pub dotnet_version: Option<String>,
    pub total_cpu_cores: Option<i64>,
    pub bios_serial: Option<String>,
    pub bios_release_date: Option<String>,
    pub bios_version: Option<String>,
    pub baseboard_manufacturer: Option<String>,
    pub baseboard_product: Option<String>,
    pub snmp_name: Option<String>,
    pub snmp_contact: Option<String>,
    pub snmp_location: Option<String>,
    pub snmp_uptime: Option<String>,
    pub snmp_serial: Option<String>,
    pub object_id: Option<String>,
    /// JSON array of network interfaces.
    pub nic_summary: Option<String>,
    /// JSON array of displays.
    pub display_summary: Option<String>,
    /// JSON array of logical disks.
    pub disks_summary: Option<String>,
    /// Processor names joined with `", "`.
    pub processors: Option<String>,
    /// Video adapter names joined with `", "`.
    pub video_boards: Option<String>,
    pub attached_devices: Option<String>,
    pub physical_memory: Option<String>,
    /// RFC 3339 time the audit was stored.
    pub fetched_at: String,
}

/// A device together with all of its dependent rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDevice {
    pub device: DeviceRow,
    pub hardware: Option<HardwareRow>,
    pub storage: Vec<StorageRow>,
    pub software: Option<SoftwareRow>,
    pub monitoring: Option<MonitoringRow>,
    pub patch_management: Option<PatchManagementRow>,
    pub lifecycle: Option<LifecycleRow>,
    pub udfs: Vec<UdfRow>,
    pub audits: Vec<DeviceAuditRow>,
}
