#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Payload types for the RMM vendor REST API.
//!
//! Field names follow the vendor's camelCase JSON. Most fields are optional
//! because the vendor omits them freely; `patchManagement` is required on
//! every device and a device list missing it fails to decode as a whole.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Response of the OAuth2 token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Bearer token for subsequent requests.
    pub access_token: String,
    /// Token type reported by the server (normally `bearer`).
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime in seconds, when reported.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Pagination block shared by the list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDetails {
    /// Number of items on this page.
    #[serde(default)]
    pub count: Option<u64>,
    /// Absolute URL of the next page, or `None` on the last page.
    #[serde(default)]
    pub next_page_url: Option<String>,
    /// Absolute URL of the previous page.
    #[serde(default)]
    pub prev_page_url: Option<String>,
}

/// A site (customer) as returned by the account sites endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    /// Vendor identifier of the site.
    pub uid: String,
    /// Display name of the site.
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// `GET /api/v2/account/sites` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitesPage {
    pub sites: Vec<Site>,
    #[serde(default)]
    pub page_details: Option<PageDetails>,
}

/// `GET /api/v2/site/{uid}/devices` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicesPage {
    pub devices: Vec<ApiDevice>,
    #[serde(default)]
    pub page_details: Option<PageDetails>,
}

/// Antivirus summary attached to a device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Antivirus {
    #[serde(default)]
    pub antivirus_product: Option<String>,
    #[serde(default)]
    pub antivirus_status: Option<String>,
}

/// Patch summary attached to a device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchManagement {
    #[serde(default)]
    pub patch_status: Option<String>,
    #[serde(default)]
    pub patches_approved_pending: Option<i64>,
    #[serde(default)]
    pub patches_not_approved: Option<i64>,
    #[serde(default)]
    pub patches_installed: Option<i64>,
}

/// One device from a site's device list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDevice {
    /// Vendor identifier; the canonical device identity.
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub last_logged_in_user: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub operating_system: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub int_ip_address: Option<String>,
    #[serde(default)]
    pub ext_ip_address: Option<String>,
    #[serde(default)]
    pub antivirus: Option<Antivirus>,
    #[serde(default)]
    pub software_status: Option<String>,
    pub patch_management: PatchManagement,
    #[serde(default)]
    pub warranty_date: Option<String>,
    /// Sent as epoch milliseconds by current API versions and as a
    /// date string by older ones.
    #[serde(default)]
    pub last_reboot: Option<serde_json::Value>,
    /// User-defined fields (`udf1` … `udf30`), values are usually strings
    /// or `null`.
    #[serde(default)]
    pub udf: BTreeMap<String, serde_json::Value>,
}

impl ApiDevice {
    /// The antivirus product name, if reported.
    #[must_use]
    pub fn antivirus_product(&self) -> Option<&str> {
        self.antivirus.as_ref()?.antivirus_product.as_deref()
    }

    /// The UID the device is stored under: trimmed, or `None` when
    /// missing or blank.
    #[must_use]
    pub fn device_uid(&self) -> Option<&str> {
        self.uid.as_deref().map(str::trim).filter(|uid| !uid.is_empty())
    }

    /// `lastReboot` as stored text: strings unchanged, numbers in their
    /// JSON form, `null` as `None`.
    #[must_use]
    pub fn last_reboot_text(&self) -> Option<String> {
        match self.last_reboot.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub total_physical_memory: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub dot_net_version: Option<String>,
    #[serde(default)]
    pub total_cpu_cores: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bios {
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub sm_bios_version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseBoard {
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnmpInfo {
    #[serde(default)]
    pub snmp_name: Option<String>,
    #[serde(default)]
    pub snmp_contact: Option<String>,
    #[serde(default)]
    pub snmp_location: Option<String>,
    #[serde(default)]
    pub snmp_uptime: Option<String>,
    #[serde(default)]
    pub snmp_serial: Option<String>,
    #[serde(default)]
    pub object_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Processor {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoBoard {
    #[serde(default)]
    pub display_adapter: String,
}

/// `GET /api/v2/audit/device/{uid}` response.
///
/// Nested inventories that are only stored as JSON summaries are kept as
/// raw values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceAudit {
    #[serde(default)]
    pub portal_url: Option<String>,
    #[serde(default)]
    pub web_remote_url: Option<String>,
    #[serde(default)]
    pub system_info: Option<SystemInfo>,
    #[serde(default)]
    pub bios: Option<Bios>,
    #[serde(default)]
    pub base_board: Option<BaseBoard>,
    #[serde(default)]
    pub snmp_info: Option<SnmpInfo>,
    #[serde(default)]
    pub nics: Vec<serde_json::Value>,
    #[serde(default)]
    pub displays: Vec<serde_json::Value>,
    #[serde(default)]
    pub logical_disks: Vec<serde_json::Value>,
    #[serde(default)]
    pub processors: Vec<Processor>,
    #[serde(default)]
    pub video_boards: Vec<VideoBoard>,
    #[serde(default)]
    pub attached_devices: Vec<serde_json::Value>,
    #[serde(default)]
    pub physical_memory: Vec<serde_json::Value>,
}
