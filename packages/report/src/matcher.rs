//! Label-driven field matching for "Detailed Computer Audit" rows.
//!
//! Every row is dispatched on its first cell against [`LABEL_RULES`], an
//! ordered table of label patterns and the record field each one fills.
//! The first matching rule wins. Rows that match no rule are checked for a
//! fixed-disk entry and are otherwise ignored; matching never fails.

use rmm_audit_report_models::{DeviceRecord, Row, StorageEntry};

/// Literal cell that marks a fixed-disk row in the "Disk Drive" table.
pub const FIXED_DISK_MARKER: &str = "Local Fixed Disk";

/// First-cell values that end the display adapter lookahead.
pub const SECTION_HEADERS: &[&str] = &[
    "Disk Drive",
    "Device Status",
    "User-Defined-Fields",
    "Device Information",
    "Hardware",
    "Networking",
];

/// Column headers that leak into the adapter table and must be skipped.
const ADAPTER_BOILERPLATE: &[&str] = &["Description", "Size", "Used"];

type Setter = fn(&mut DeviceRecord, String);

/// How a rule recognizes its row from the first cell.
#[derive(Debug, Clone, Copy)]
enum Pattern {
    /// The first cell starts with this text.
    Prefix(&'static str),
    /// The first cell contains any of these substrings.
    ContainsAny(&'static [&'static str]),
}

impl Pattern {
    fn matches(self, first_cell: &str) -> bool {
        match self {
            Self::Prefix(prefix) => first_cell.starts_with(prefix),
            Self::ContainsAny(needles) => needles.iter().any(|n| first_cell.contains(n)),
        }
    }
}

/// What a matched rule writes.
#[derive(Debug, Clone, Copy)]
enum Action {
    /// The text after the colon of the cell starting with the label.
    Labelled(Setter),
    /// The row's rightmost cell.
    LastCell(Setter),
    /// Adapter names collected from the following rows.
    DisplayAdapters,
}

#[derive(Debug, Clone, Copy)]
struct LabelRule {
    pattern: Pattern,
    action: Action,
}

/// Dispatch table in precedence order.
static LABEL_RULES: &[LabelRule] = &[
    LabelRule {
        pattern: Pattern::Prefix("Device Name:"),
        action: Action::Labelled(|r, v| r.device.device_name = v),
    },
    LabelRule {
        pattern: Pattern::Prefix("Description:"),
        action: Action::Labelled(|r, v| r.device.description = v),
    },
    LabelRule {
        pattern: Pattern::Prefix("Domain:"),
        action: Action::Labelled(|r, v| r.device.domain = v),
    },
    LabelRule {
        pattern: Pattern::Prefix("Last User:"),
        action: Action::Labelled(|r, v| r.device.last_user = v),
    },
    LabelRule {
        pattern: Pattern::Prefix("Serial Number:"),
        action: Action::Labelled(|r, v| r.device.serial_number = v),
    },
    LabelRule {
        pattern: Pattern::Prefix("Last Reboot:"),
        action: Action::Labelled(|r, v| r.device.last_reboot = v),
    },
    LabelRule {
        pattern: Pattern::Prefix("Operating System:"),
        action: Action::Labelled(|r, v| r.device.os_version = v),
    },
    LabelRule {
        pattern: Pattern::Prefix("OS Architecture:"),
        action: Action::Labelled(|r, v| r.device.architecture = v),
    },
    LabelRule {
        pattern: Pattern::Prefix("Windows Activation Key:"),
        action: Action::Labelled(|r, v| r.device.windows_key = v),
    },
    LabelRule {
        pattern: Pattern::Prefix("Processor:"),
        action: Action::Labelled(|r, v| r.hardware.cpu = v),
    },
    LabelRule {
        pattern: Pattern::Prefix("Memory:"),
        action: Action::Labelled(|r, v| r.hardware.ram = v),
    },
    LabelRule {
        pattern: Pattern::Prefix("Motherboard:"),
        action: Action::Labelled(|r, v| r.hardware.motherboard = v),
    },
    LabelRule {
        pattern: Pattern::Prefix("BIOS Name:"),
        action: Action::Labelled(|r, v| r.hardware.bios_version = v),
    },
    LabelRule {
        pattern: Pattern::Prefix("Display Adapter"),
        action: Action::DisplayAdapters,
    },
    LabelRule {
        pattern: Pattern::Prefix("Office Activation Key:"),
        action: Action::Labelled(|r, v| r.software.office_key = v),
    },
    LabelRule {
        pattern: Pattern::Prefix("BitLocker Detail:"),
        action: Action::Labelled(|r, v| r.software.bitlocker_status = v),
    },
    LabelRule {
        pattern: Pattern::Prefix("Antivirus Product:"),
        action: Action::Labelled(|r, v| r.software.antivirus = v),
    },
    LabelRule {
        pattern: Pattern::Prefix("Ext IP Address:"),
        action: Action::Labelled(|r, v| r.monitoring.network_ext_ip = v),
    },
    LabelRule {
        pattern: Pattern::Prefix("Int IP Address:"),
        action: Action::Labelled(|r, v| r.monitoring.network_int_ip = v),
    },
    LabelRule {
        pattern: Pattern::ContainsAny(&["Realtek", "MAC Address"]),
        action: Action::LastCell(|r, v| r.monitoring.mac_address = v),
    },
    LabelRule {
        pattern: Pattern::Prefix("Warranty Date:"),
        action: Action::Labelled(|r, v| r.lifecycle.warranty_date = v),
    },
    LabelRule {
        pattern: Pattern::Prefix("Warranty Status:"),
        action: Action::Labelled(|r, v| r.lifecycle.warranty_status = v),
    },
    LabelRule {
        pattern: Pattern::Prefix("Purchase Date:"),
        action: Action::Labelled(|r, v| r.lifecycle.purchase_date = v),
    },
];

/// Runs every row of a device's row run through the matcher.
pub fn apply_rows(record: &mut DeviceRecord, rows: &[Row]) {
    for idx in 0..rows.len() {
        apply_row(record, rows, idx);
    }
}

/// Matches `rows[idx]` and writes the result into `record`.
///
/// The whole run is passed so multi-row fields can look ahead. Returns
/// whether the row was recognized.
pub fn apply_row(record: &mut DeviceRecord, rows: &[Row], idx: usize) -> bool {
    let Some(row) = rows.get(idx) else {
        return false;
    };
    let Some(first_cell) = row.first().map(|cell| cell.trim()) else {
        return false;
    };

    if let Some(rule) = LABEL_RULES.iter().find(|rule| rule.pattern.matches(first_cell)) {
        match rule.action {
            Action::Labelled(set) => {
                let Pattern::Prefix(prefix) = rule.pattern else {
                    return false;
                };
                set(record, labelled_value(row, prefix.trim_end_matches(':')));
            }
            Action::LastCell(set) => {
                set(record, row.last().map(|cell| cell.trim().to_owned()).unwrap_or_default());
            }
            Action::DisplayAdapters => {
                record.hardware.display_adapter =
                    collect_display_adapters(&rows[idx + 1..]).join(" | ");
            }
        }
        return true;
    }

    if row.iter().any(|cell| cell.trim() == FIXED_DISK_MARKER) {
        record.storage.push(storage_entry(row));
        return true;
    }

    false
}

/// Returns the text after the first colon of the first cell that starts
/// with `label`, or the empty string when no cell does.
#[must_use]
pub fn labelled_value(row: &[String], label: &str) -> String {
    row.iter()
        .find(|cell| cell.trim().starts_with(label))
        .map(|cell| {
            cell.split_once(':')
                .map_or(cell.as_str(), |(_, value)| value)
                .trim()
                .to_owned()
        })
        .unwrap_or_default()
}

/// Collects distinct display adapter names from the rows following the
/// "Display Adapter" label, stopping at the next section header.
///
/// Cells may pack several adapters separated by `|`.
#[must_use]
pub fn collect_display_adapters(rows: &[Row]) -> Vec<String> {
    let mut adapters: Vec<String> = Vec::new();

    for row in rows {
        let first_cell = row.first().map_or("", |cell| cell.trim());
        if SECTION_HEADERS.contains(&first_cell) {
            break;
        }

        for cell in row.iter().map(|cell| cell.trim()) {
            if cell.is_empty()
                || SECTION_HEADERS.contains(&cell)
                || ADAPTER_BOILERPLATE.iter().any(|header| cell.contains(header))
            {
                continue;
            }

            for adapter in cell.split('|').map(str::trim) {
                if !adapter.is_empty() && !adapters.iter().any(|known| known == adapter) {
                    adapters.push(adapter.to_owned());
                }
            }
        }
    }

    adapters
}

/// Reads a fixed-disk row positionally. Missing trailing columns become
/// empty strings.
#[must_use]
pub fn storage_entry(row: &[String]) -> StorageEntry {
    let column = |idx: usize| row.get(idx).map(|cell| cell.trim().to_owned()).unwrap_or_default();

    StorageEntry {
        drive_letter: column(0),
        disk_description: column(1),
        disk_size: column(2),
        disk_used: column(3),
        disk_usage_percent: column(4),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(input: &[&[&str]]) -> Vec<Row> {
        input
            .iter()
            .map(|row| row.iter().map(|cell| (*cell).to_owned()).collect())
            .collect()
    }

    fn matched(input: &[&[&str]]) -> DeviceRecord {
        let mut record = DeviceRecord::default();
        apply_rows(&mut record, &rows(input));
        record
    }

    #[test]
    fn maps_single_line_labels() {
        let record = matched(&[
            &["Device Name: WS-01", ""],
            &["Description: Front desk"],
            &["Domain: CORP"],
            &["Last User: CORP\\jdoe"],
            &["Serial Number: 5CG1234"],
            &["Last Reboot: 2024-03-01 08:00"],
            &["Operating System: Windows 11 Pro"],
            &["OS Architecture: 64-bit"],
            &["Windows Activation Key: XXXXX-YYYYY"],
            &["Processor: Intel i7"],
            &["Memory: 16 GB"],
            &["Motherboard: HP 8A3C"],
            &["BIOS Name: U23 Ver. 01.02"],
            &["Office Activation Key: ZZZZZ"],
            &["BitLocker Detail: Fully Encrypted"],
            &["Antivirus Product: Defender"],
            &["Ext IP Address: 203.0.113.7"],
            &["Int IP Address: 10.0.0.12"],
            &["Warranty Date: 2026-01-01"],
            &["Warranty Status: Active"],
            &["Purchase Date: 2023-01-01"],
        ]);

        assert_eq!(record.device.device_name, "WS-01");
        assert_eq!(record.device.description, "Front desk");
        assert_eq!(record.device.domain, "CORP");
        assert_eq!(record.device.last_user, "CORP\\jdoe");
        assert_eq!(record.device.serial_number, "5CG1234");
        assert_eq!(record.device.last_reboot, "2024-03-01 08:00");
        assert_eq!(record.device.os_version, "Windows 11 Pro");
        assert_eq!(record.device.architecture, "64-bit");
        assert_eq!(record.device.windows_key, "XXXXX-YYYYY");
        assert_eq!(record.hardware.cpu, "Intel i7");
        assert_eq!(record.hardware.ram, "16 GB");
        assert_eq!(record.hardware.motherboard, "HP 8A3C");
        assert_eq!(record.hardware.bios_version, "U23 Ver. 01.02");
        assert_eq!(record.software.office_key, "ZZZZZ");
        assert_eq!(record.software.bitlocker_status, "Fully Encrypted");
        assert_eq!(record.software.antivirus, "Defender");
        assert_eq!(record.monitoring.network_ext_ip, "203.0.113.7");
        assert_eq!(record.monitoring.network_int_ip, "10.0.0.12");
        assert_eq!(record.lifecycle.warranty_date, "2026-01-01");
        assert_eq!(record.lifecycle.warranty_status, "Active");
        assert_eq!(record.lifecycle.purchase_date, "2023-01-01");
    }

    #[test]
    fn value_is_taken_from_matching_cell_anywhere_in_row() {
        assert_eq!(
            labelled_value(&rows(&[&["x", " Domain: CORP "]])[0], "Domain"),
            "CORP"
        );
        assert_eq!(labelled_value(&rows(&[&["x", "y"]])[0], "Domain"), "");
    }

    #[test]
    fn value_keeps_text_after_first_colon_only() {
        let record = matched(&[&["Last Reboot: 2024-03-01 08:15:00"]]);
        assert_eq!(record.device.last_reboot, "2024-03-01 08:15:00");
    }

    #[test]
    fn last_match_wins() {
        let record = matched(&[&["Device Name: OLD"], &["Device Name: NEW"]]);
        assert_eq!(record.device.device_name, "NEW");
    }

    #[test]
    fn unmatched_rows_leave_record_untouched() {
        let record = matched(&[
            &["Something else: 1"],
            &["device name: lowercase does not match"],
            &[],
            &["", "Processor: not in first cell"],
        ]);
        assert_eq!(record, DeviceRecord::default());
    }

    #[test]
    fn label_must_be_a_prefix_of_the_first_cell() {
        let record = matched(&[&["Primary Processor: Intel i9"]]);
        assert!(record.hardware.cpu.is_empty());
    }

    #[test]
    fn mac_address_uses_last_cell() {
        let record = matched(&[&[
            "Realtek PCIe GbE Family Controller",
            "10.0.0.12",
            "00-1A-2B-3C-4D-5E",
        ]]);
        assert_eq!(record.monitoring.mac_address, "00-1A-2B-3C-4D-5E");

        let record = matched(&[&["MAC Address", "AA:BB:CC:DD:EE:FF"]]);
        assert_eq!(record.monitoring.mac_address, "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn display_adapters_are_collected_until_section_header() {
        let record = matched(&[
            &["Display Adapter", ""],
            &["Description", "Size"],
            &["Intel(R) UHD Graphics 620", ""],
            &["NVIDIA GeForce MX150 | Intel(R) UHD Graphics 620", ""],
            &["Microsoft Basic Display Adapter", "Used"],
            &["Disk Drive", ""],
            &["Not An Adapter", ""],
        ]);

        assert_eq!(
            record.hardware.display_adapter,
            "Intel(R) UHD Graphics 620 | NVIDIA GeForce MX150 | Microsoft Basic Display Adapter"
        );
    }

    #[test]
    fn adapter_list_is_deduplicated_and_skips_header_cells() {
        let adapters = collect_display_adapters(&rows(&[&["A"], &["B|A"], &["Hardware"]]));
        assert_eq!(adapters, vec!["A", "B"]);

        let adapters = collect_display_adapters(&rows(&[&["A", "Networking"], &["C"]]));
        assert_eq!(adapters, vec!["A", "C"]);

        assert!(collect_display_adapters(&[]).is_empty());
    }

    #[test]
    fn display_adapter_on_last_row_yields_empty_list() {
        let record = matched(&[&["Display Adapter"]]);
        assert_eq!(record.hardware.display_adapter, "");
    }

    #[test]
    fn rows_after_adapter_label_are_still_dispatched() {
        let record = matched(&[
            &["Display Adapter"],
            &["Intel HD"],
            &["Antivirus Product: Defender"],
            &["Hardware"],
        ]);

        assert_eq!(record.software.antivirus, "Defender");
        assert_eq!(
            record.hardware.display_adapter,
            "Intel HD | Antivirus Product: Defender"
        );
    }

    #[test]
    fn fixed_disk_rows_are_read_positionally() {
        let record = matched(&[
            &["Device Name: WS-01"],
            &["Processor: Intel i7"],
            &["Local Fixed Disk", "C:", "500GB", "200GB", "40%"],
        ]);

        assert_eq!(record.device.device_name, "WS-01");
        assert_eq!(record.hardware.cpu, "Intel i7");
        assert_eq!(
            record.storage,
            vec![StorageEntry {
                drive_letter: "Local Fixed Disk".to_owned(),
                disk_description: "C:".to_owned(),
                disk_size: "500GB".to_owned(),
                disk_used: "200GB".to_owned(),
                disk_usage_percent: "40%".to_owned(),
            }]
        );
    }

    #[test]
    fn short_fixed_disk_rows_default_missing_columns() {
        let record = matched(&[&["D:", "Local Fixed Disk"]]);

        assert_eq!(record.storage.len(), 1);
        let entry = &record.storage[0];
        assert_eq!(entry.drive_letter, "D:");
        assert_eq!(entry.disk_description, "Local Fixed Disk");
        assert!(entry.disk_size.is_empty());
        assert!(entry.disk_used.is_empty());
        assert!(entry.disk_usage_percent.is_empty());
    }

    #[test]
    fn storage_entries_are_appended_in_order() {
        let record = matched(&[
            &["C:", "Local Fixed Disk", "500GB", "200GB", "40%"],
            &["E:", "Removable Disk", "32GB", "1GB", "3%"],
            &["D:", "Local Fixed Disk", "1TB", "100GB", "10%"],
            &["C:", "Local Fixed Disk", "500GB", "200GB", "40%"],
        ]);

        let letters: Vec<&str> = record.storage.iter().map(|s| s.drive_letter.as_str()).collect();
        assert_eq!(letters, vec!["C:", "D:", "C:"]);
    }

    #[test]
    fn labelled_rows_are_not_storage() {
        let record = matched(&[&["Description: x", "Local Fixed Disk"]]);
        assert!(record.storage.is_empty());
        assert_eq!(record.device.description, "x");
    }
}
