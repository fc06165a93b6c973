#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Device record extraction from RMM audit report tables.
//!
//! The pipeline is:
//!
//! 1. [`grids`] turns a report file into an ordered list of
//!    [`TableGrid`]s.
//! 2. [`grouper`] splits those grids into one row run per device.
//! 3. [`matcher`] maps each row run onto a [`DeviceRecord`].
//!
//! Extraction is lenient: rows that do not look like anything known are
//! skipped, so a damaged or reordered report yields sparse records rather
//! than an error.

pub mod grids;
pub mod grouper;
pub mod matcher;
pub mod template;

use std::path::Path;

use rmm_audit_report_models::{DeviceRecord, ReportTemplate, Row, TableGrid};

pub use grids::PdfGridOptions;
pub use grouper::GroupingMode;

/// Errors that can occur while reading a report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// The file name does not match any known report template.
    #[error("Unsupported report: {file_name}")]
    UnsupportedReport {
        /// Name of the rejected file.
        file_name: String,
    },

    /// The file is neither a PDF nor a JSON grid dump.
    #[error("Invalid file type: {file_name}")]
    UnsupportedFileType {
        /// Name of the rejected file.
        file_name: String,
    },

    /// PDF text extraction failed.
    #[error("PDF extraction error: {0}")]
    Extraction(String),

    /// A JSON grid file could not be parsed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Options controlling how a report file is turned into records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// PDF reader settings.
    pub pdf: PdfGridOptions,
    /// How grids are split into devices.
    pub grouping: GroupingMode,
}

/// Builds one record from a device's row run.
#[must_use]
pub fn assemble_device(rows: &[Row]) -> DeviceRecord {
    for (idx, row) in rows.iter().enumerate() {
        log::trace!("{idx:03}: {}", row.join(" | "));
    }

    let mut record = DeviceRecord::default();
    matcher::apply_rows(&mut record, rows);
    record
}

/// Extracts one [`DeviceRecord`] per device from a report's grids.
///
/// Rows before the first "Device Information" grid are discarded.
#[must_use]
pub fn extract_devices(grids: &[TableGrid], grouping: GroupingMode) -> Vec<DeviceRecord> {
    grouper::group(grids, grouping)
        .into_iter()
        .filter_map(|group| {
            if group.is_preamble {
                log::warn!(
                    "Discarding {} row(s) that precede the first device",
                    group.rows.len()
                );
                return None;
            }
            Some(assemble_device(&group.rows))
        })
        .collect()
}

/// Extracts records from grids using the rules of `template`.
#[must_use]
pub fn extract_with_template(
    template: ReportTemplate,
    grids: &[TableGrid],
    grouping: GroupingMode,
) -> Vec<DeviceRecord> {
    match template {
        ReportTemplate::DetailedComputerAudit => extract_devices(grids, grouping),
    }
}

/// Detects the template of a report file, loads its grids, and extracts
/// its device records.
///
/// # Errors
///
/// Returns [`ReportError`] if the file name matches no template, the file
/// type is not supported, or the file cannot be read.
pub fn extract_report(
    path: &Path,
    options: &ExtractOptions,
) -> Result<(ReportTemplate, Vec<DeviceRecord>), ReportError> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let template = template::detect_template(&file_name)?;
    let grids = grids::load_grids(path, &options.pdf)?;
    let records = extract_with_template(template, &grids, options.grouping);

    log::info!(
        "Extracted {} device(s) from {file_name} ({template})",
        records.len()
    );

    Ok((template, records))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> TableGrid {
        TableGrid::new(
            rows.iter()
                .map(|row| row.iter().map(|cell| (*cell).to_owned()).collect())
                .collect(),
        )
    }

    #[test]
    fn extracts_one_record_per_device() {
        let grids = vec![
            grid(&[&["Audit Summary"], &["Device Name: should be ignored"]]),
            grid(&[&["Device Information"], &["Device Name: WS-01"]]),
            grid(&[
                &["Hardware"],
                &["Processor: Intel i7"],
                &["Display Adapter"],
                &["Intel UHD 620"],
            ]),
            grid(&[
                &["Disk Drive"],
                &["Drive", "Description", "Size", "Used", "Used %"],
                &["C:", "Local Fixed Disk", "476 GB", "120 GB", "25%"],
            ]),
            grid(&[&["Device Information"], &["Device Name: WS-02"]]),
            grid(&[&["Networking"], &["Int IP Address: 10.0.0.3"]]),
        ];

        let records = extract_devices(&grids, GroupingMode::Sentinel);

        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.device.device_name, "WS-01");
        assert_eq!(first.hardware.cpu, "Intel i7");
        assert_eq!(first.hardware.display_adapter, "Intel UHD 620");
        assert_eq!(first.storage.len(), 1);
        assert_eq!(first.storage[0].drive_letter, "C:");
        assert_eq!(first.storage[0].disk_usage_percent, "25%");
        assert!(first.monitoring.network_int_ip.is_empty());

        let second = &records[1];
        assert_eq!(second.device.device_name, "WS-02");
        assert_eq!(second.monitoring.network_int_ip, "10.0.0.3");
        assert!(second.hardware.cpu.is_empty());
        assert!(second.storage.is_empty());
    }

    #[test]
    fn report_without_sentinel_yields_no_devices() {
        let grids = vec![grid(&[&["Device Name: WS-01"]])];
        assert!(extract_devices(&grids, GroupingMode::Sentinel).is_empty());
    }

    #[test]
    fn placeholder_sections_stay_default() {
        let grids = vec![grid(&[
            &["Device Information"],
            &["Device Name: WS-01"],
            &["Device Status"],
            &["Last Patch Date: 2024-01-01"],
        ])];

        let records = extract_devices(&grids, GroupingMode::Sentinel);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].security_events, Default::default());
        assert_eq!(records[0].backups, Default::default());
        assert_eq!(records[0].device_health, Default::default());
        assert_eq!(records[0].patch_management, Default::default());
    }

    #[test]
    fn unsupported_report_is_rejected_before_reading() {
        let err = extract_report(
            Path::new("/nonexistent/Device Activity.pdf"),
            &ExtractOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ReportError::UnsupportedReport { .. }));
    }

    #[test]
    fn extracts_report_from_json_grids() {
        let dir = std::env::temp_dir().join(format!("rmm_audit_report_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("Acme Detailed Computer Audit.json");
        std::fs::write(
            &path,
            r#"[
                [["Device Information"], ["Device Name: WS-01", "Domain: CORP"]],
                [["Hardware"], ["Memory: 16 GB"]]
            ]"#,
        )
        .unwrap();

        let (template, records) = extract_report(&path, &ExtractOptions::default()).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(template, ReportTemplate::DetailedComputerAudit);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].device.device_name, "WS-01");
        assert_eq!(records[0].device.domain, "");
        assert_eq!(records[0].hardware.ram, "16 GB");
    }
}
