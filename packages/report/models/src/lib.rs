#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Table grids and the canonical per-device record extracted from RMM audit
//! reports.
//!
//! A [`TableGrid`] is one table as produced by the upstream table detector:
//! rows of trimmed string cells. A [`DeviceRecord`] is the fixed-shape result
//! of matching one device's rows. Every attribute is a plain `String` where
//! the empty string means "not found".

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Sentinel text that opens a new device in a report (matched
/// case-insensitively against the first cell of a grid).
pub const DEVICE_SENTINEL: &str = "device information";

/// One row of extracted table cells.
pub type Row = Vec<String>;

/// A single extracted table: an ordered list of rows of cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableGrid {
    /// Rows in source order.
    pub rows: Vec<Row>,
}

impl TableGrid {
    /// Creates a grid from raw rows, cleaning every cell.
    ///
    /// Embedded line breaks are removed and the result is trimmed, matching
    /// how cells are compared everywhere else.
    #[must_use]
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.iter().map(|cell| clean_cell(cell)).collect())
                .collect(),
        }
    }

    /// Returns the first cell of the first row, if any.
    #[must_use]
    pub fn first_cell(&self) -> Option<&str> {
        self.rows.first()?.first().map(String::as_str)
    }

    /// Whether this grid opens a new device ("Device Information" header).
    #[must_use]
    pub fn is_device_header(&self) -> bool {
        self.first_cell()
            .is_some_and(|cell| cell.trim().to_lowercase().contains(DEVICE_SENTINEL))
    }

    /// Whether the grid has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl From<Vec<Row>> for TableGrid {
    fn from(rows: Vec<Row>) -> Self {
        Self::new(rows)
    }
}

/// Removes line breaks from a cell and trims surrounding whitespace.
#[must_use]
pub fn clean_cell(cell: &str) -> String {
    cell.replace(['\r', '\n'], "").trim().to_owned()
}

/// Report template families the extractor understands.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportTemplate {
    /// The vendor's "Detailed Computer Audit" export.
    DetailedComputerAudit,
}

impl ReportTemplate {
    /// Text that identifies the template in a report's file name.
    #[must_use]
    pub const fn file_name_marker(self) -> &'static str {
        match self {
            Self::DetailedComputerAudit => "Detailed Computer Audit",
        }
    }
}

/// Identity and operating-system attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSection {
    pub device_name: String,
    pub description: String,
    pub domain: String,
    pub last_user: String,
    pub serial_number: String,
    pub os_version: String,
    pub architecture: String,
    pub windows_key: String,
    pub last_reboot: String,
}

/// Hardware attributes. `display_adapter` is a `" | "`-joined list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareSection {
    pub cpu: String,
    pub ram: String,
    pub motherboard: String,
    pub bios_version: String,
    pub display_adapter: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftwareSection {
    pub office_key: String,
    pub antivirus: String,
    pub bitlocker_status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringSection {
    pub network_ext_ip: String,
    pub network_int_ip: String,
    pub mac_address: String,
}

/// Not populated by the report matcher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityEventsSection {
    pub firewall_enabled: String,
    pub defender_active: String,
    pub last_scan: String,
}

/// Not populated by the report matcher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupsSection {
    pub backup_status: String,
    pub last_backup: String,
}

/// Not populated by the report matcher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceHealthSection {
    pub status: String,
    pub issues: String,
}

/// Not populated by the report matcher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchManagementSection {
    pub pending_updates: String,
    pub last_patch_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleSection {
    pub purchase_date: String,
    pub warranty_date: String,
    pub warranty_status: String,
}

/// One fixed-disk row from the report's "Disk Drive" table.
///
/// Columns are positional; see the matcher for the exact mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEntry {
    pub drive_letter: String,
    pub disk_description: String,
    pub disk_size: String,
    pub disk_used: String,
    pub disk_usage_percent: String,
}

/// Everything extracted for a single device from one report.
///
/// Built fresh per device, populated in a single pass over the device's row
/// run, then handed to persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub device: DeviceSection,
    pub hardware: HardwareSection,
    pub software: SoftwareSection,
    pub monitoring: MonitoringSection,
    pub security_events: SecurityEventsSection,
    pub backups: BackupsSection,
    pub device_health: DeviceHealthSection,
    pub patch_management: PatchManagementSection,
    pub lifecycle: LifecycleSection,
    /// Fixed disks in source order.
    pub storage: Vec<StorageEntry>,
}
