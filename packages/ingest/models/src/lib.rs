#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Ingestion progress and result types.

pub mod progress;

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Outcome of ingesting one report file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFileResult {
    /// The file that was processed.
    pub path: PathBuf,
    /// Name of the detected report template, if one matched.
    pub template: Option<String>,
    /// Devices extracted from the file.
    pub devices_extracted: u64,
    /// Devices written to the database.
    pub devices_stored: u64,
    /// Why the file (or some of its devices) failed, if it did.
    pub error: Option<String>,
}

impl ReportFileResult {
    /// A file rejected before any device was extracted.
    #[must_use]
    pub fn failed(path: PathBuf, error: String) -> Self {
        Self {
            path,
            template: None,
            devices_extracted: 0,
            devices_stored: 0,
            error: Some(error),
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of a report ingestion batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportBatchSummary {
    /// One entry per input file, in input order.
    pub files: Vec<ReportFileResult>,
    /// How long the batch took.
    pub duration: Duration,
}

impl ReportBatchSummary {
    /// Total devices written across all files.
    #[must_use]
    pub fn devices_stored(&self) -> u64 {
        self.files.iter().map(|f| f.devices_stored).sum()
    }

    /// Files that did not ingest cleanly.
    #[must_use]
    pub fn failed_files(&self) -> Vec<&ReportFileResult> {
        self.files.iter().filter(|f| !f.is_success()).collect()
    }
}

/// Result of ingesting one RMM site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSummary {
    pub site_name: String,
    pub site_uid: String,
    /// Devices returned by the API.
    pub devices_fetched: u64,
    /// Devices written to the database.
    pub devices_stored: u64,
    /// Devices skipped for lacking a usable UID.
    pub devices_skipped: u64,
    /// Devices whose write failed and was rolled back.
    pub devices_failed: u64,
    /// Audits written (only when audits were requested).
    pub audits_stored: u64,
    /// Audits that could not be fetched or written.
    pub audits_failed: u64,
    /// How long the ingestion took.
    pub duration: Duration,
}
