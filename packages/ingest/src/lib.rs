#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Ingestion of RMM audit data into the `SQLite` database.
//!
//! Two flows share one database:
//!
//! - [`ingest_reports`] parses exported audit reports (PDF or pre-extracted
//!   JSON grids) and stores one device per report section.
//! - [`ingest_site`] pulls a site's device list from the RMM REST API and
//!   upserts each device by its vendor UID.
//!
//! Both flows reset the schema before writing, so the database always
//! reflects the most recent run.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use rmm_audit_api::{ApiError, RmmClient};
use rmm_audit_config::{AppConfig, ConfigError};
use rmm_audit_database::{DbError, insert_api_device, insert_device_audit, insert_report_device};
use rmm_audit_ingest_models::progress::ProgressCallback;
use rmm_audit_ingest_models::{ReportBatchSummary, ReportFileResult, SiteSummary};
use rmm_audit_report::{ExtractOptions, ReportError};
use rmm_audit_report_models::{DeviceRecord, ReportTemplate};
use switchy_database::Database;

/// Errors that abort an ingestion run.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// A report could not be read or parsed.
    #[error(transparent)]
    Report(#[from] ReportError),

    /// An RMM API request failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The configuration is missing something the run needs.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A database operation failed.
    #[error(transparent)]
    Db(#[from] DbError),

    /// A report file exceeds the configured size limit.
    #[error("{} is {size} bytes, exceeding the {limit} byte limit", path.display())]
    FileTooLarge {
        /// The rejected file.
        path: PathBuf,
        /// Its size in bytes.
        size: u64,
        /// The configured limit.
        limit: u64,
    },
}

/// Options for report ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportIngestOptions {
    /// How grids are read and grouped into devices.
    pub extract: ExtractOptions,
    /// Files larger than this are rejected without being read.
    pub max_file_bytes: u64,
}

impl ReportIngestOptions {
    /// Options using the config's size limit and default extraction.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            extract: ExtractOptions::default(),
            max_file_bytes: config.max_report_bytes,
        }
    }
}

/// Checks the size of `path`, then extracts its device records.
///
/// # Errors
///
/// Returns [`IngestError::FileTooLarge`] if the file exceeds the limit, or
/// [`IngestError::Report`] if the file cannot be read or is unsupported.
pub fn extract_report(
    path: &Path,
    options: &ReportIngestOptions,
) -> Result<(ReportTemplate, Vec<DeviceRecord>), IngestError> {
    let size = std::fs::metadata(path).map_err(ReportError::from)?.len();
    if size > options.max_file_bytes {
        return Err(IngestError::FileTooLarge {
            path: path.to_path_buf(),
            size,
            limit: options.max_file_bytes,
        });
    }

    Ok(rmm_audit_report::extract_report(path, &options.extract)?)
}

/// Stores every record, returning how many were written and the last
/// write error, if any.
async fn store_records(db: &dyn Database, records: &[DeviceRecord]) -> (u64, Option<String>) {
    let mut stored = 0;
    let mut last_error = None;

    for record in records {
        match insert_report_device(db, record).await {
            Ok(id) => {
                log::debug!("Stored {} as device {id}", record.device.device_name);
                stored += 1;
            }
            Err(e) => {
                log::error!(
                    "Failed to store device '{}': {e}",
                    record.device.device_name
                );
                last_error = Some(e.to_string());
            }
        }
    }

    (stored, last_error)
}

/// Resets the database and ingests every report in `paths`.
///
/// A file that cannot be read, is unsupported, or is too large is recorded
/// as failed and the batch continues with the next file.
///
/// # Errors
///
/// Returns [`IngestError::Db`] if the schema reset fails.
pub async fn ingest_reports(
    db: &dyn Database,
    paths: &[PathBuf],
    options: &ReportIngestOptions,
    progress: Arc<dyn ProgressCallback>,
) -> Result<ReportBatchSummary, IngestError> {
    let start = Instant::now();

    rmm_audit_database::reset_schema(db).await?;
    progress.set_total(paths.len() as u64);

    let mut files = Vec::with_capacity(paths.len());

    for path in paths {
        progress.set_message(path.display().to_string());

        let result = match extract_report(path, options) {
            Ok((template, records)) => {
                let (stored, error) = store_records(db, &records).await;
                ReportFileResult {
                    path: path.clone(),
                    template: Some(template.to_string()),
                    devices_extracted: records.len() as u64,
                    devices_stored: stored,
                    error,
                }
            }
            Err(e) => {
                log::error!("Skipping {}: {e}", path.display());
                ReportFileResult::failed(path.clone(), e.to_string())
            }
        };

        files.push(result);
        progress.inc(1);
    }

    let summary = ReportBatchSummary {
        files,
        duration: start.elapsed(),
    };

    progress.finish(format!(
        "{} device(s) from {} file(s)",
        summary.devices_stored(),
        summary.files.len()
    ));

    log::info!(
        "Report ingestion complete: {} device(s), {} failed file(s) in {:.1}s",
        summary.devices_stored(),
        summary.failed_files().len(),
        summary.duration.as_secs_f64()
    );

    Ok(summary)
}

/// Fetches the devices of the configured site `site_name` and replaces
/// the database contents with them.
///
/// Devices are fetched before the schema is reset, so an API failure
/// leaves the previous data intact. Devices without a usable UID are
/// skipped; devices whose write fails are counted and the run continues.
/// With `with_audits`, each stored device's audit is fetched and stored
/// too.
///
/// # Errors
///
/// Returns [`IngestError`] if the site is not configured, authentication
/// or the device listing fails, or the schema reset fails.
pub async fn ingest_site(
    db: &dyn Database,
    client: &mut RmmClient,
    config: &AppConfig,
    site_name: &str,
    with_audits: bool,
    progress: Arc<dyn ProgressCallback>,
) -> Result<SiteSummary, IngestError> {
    let start = Instant::now();
    let site_uid = config.site_uid(site_name)?.to_string();

    log::info!("Ingesting site {site_name} ({site_uid})");

    if !client.is_authenticated() {
        client.authenticate().await?;
    }

    progress.set_message(format!("Fetching devices for {site_name}"));
    let devices = client.site_devices(&site_uid).await?;
    log::info!("{site_name}: fetched {} device(s)", devices.len());

    rmm_audit_database::reset_schema(db).await?;

    let mut summary = SiteSummary {
        site_name: site_name.to_string(),
        site_uid,
        devices_fetched: devices.len() as u64,
        ..SiteSummary::default()
    };

    progress.set_total(devices.len() as u64);
    progress.set_message(format!("Storing {site_name} devices"));

    let mut stored_uids = Vec::with_capacity(devices.len());

    for device in &devices {
        match insert_api_device(db, device).await {
            Ok(Some(_)) => {
                summary.devices_stored += 1;
                if let Some(uid) = device.device_uid() {
                    stored_uids.push(uid.to_string());
                }
            }
            Ok(None) => summary.devices_skipped += 1,
            Err(e) => {
                log::error!(
                    "Failed to store device {}: {e}",
                    device.hostname.as_deref().unwrap_or("<unnamed>")
                );
                summary.devices_failed += 1;
            }
        }
        progress.inc(1);
    }

    if with_audits {
        progress.set_total(stored_uids.len() as u64);
        progress.set_message(format!("Fetching {site_name} audits"));

        for uid in &stored_uids {
            match fetch_and_store_audit(db, client, uid).await {
                Ok(true) => summary.audits_stored += 1,
                Ok(false) => summary.audits_failed += 1,
                Err(e) => {
                    log::error!("Audit for {uid} failed: {e}");
                    summary.audits_failed += 1;
                }
            }
            progress.inc(1);
        }
    }

    summary.duration = start.elapsed();

    progress.finish(format!(
        "{site_name}: {} stored, {} skipped, {} failed",
        summary.devices_stored, summary.devices_skipped, summary.devices_failed
    ));

    log::info!(
        "{site_name}: {} stored, {} skipped, {} failed, {} audit(s) in {:.1}s",
        summary.devices_stored,
        summary.devices_skipped,
        summary.devices_failed,
        summary.audits_stored,
        summary.duration.as_secs_f64()
    );

    Ok(summary)
}

async fn fetch_and_store_audit(
    db: &dyn Database,
    client: &RmmClient,
    uid: &str,
) -> Result<bool, IngestError> {
    let audit = client.device_audit(uid).await?;
    Ok(insert_device_audit(db, uid, &audit).await?.is_some())
}

/// Refreshes the `[sites]` table of `config` from the API and writes the
/// config back to `path`. Returns the number of sites.
///
/// # Errors
///
/// Returns [`IngestError`] if authentication, the site listing, or the
/// config write fails.
pub async fn update_sites(
    client: &mut RmmClient,
    config: &mut AppConfig,
    path: &Path,
) -> Result<usize, IngestError> {
    if !client.is_authenticated() {
        client.authenticate().await?;
    }

    let sites = client.sites().await?;
    config.set_sites(&sites);
    config.save(path)?;

    log::info!("Saved {} site(s) to {}", config.sites.len(), path.display());

    Ok(config.sites.len())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rmm_audit_api::ApiCredentials;
    use rmm_audit_ingest_models::progress::null_progress;

    use super::*;

    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    /// A scratch directory removed on drop.
    struct TempDir(PathBuf);

    impl TempDir {
        fn new() -> Self {
            let path = std::env::temp_dir().join(format!(
                "rmm_audit_ingest_{}_{}",
                std::process::id(),
                COUNTER.fetch_add(1, Ordering::SeqCst)
            ));
            std::fs::remove_dir_all(&path).ok();
            std::fs::create_dir_all(&path).unwrap();
            Self(path)
        }

        fn write(&self, name: &str, contents: &str) -> PathBuf {
            let path = self.0.join(name);
            std::fs::write(&path, contents).unwrap();
            path
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            std::fs::remove_dir_all(&self.0).ok();
        }
    }

    const TWO_DEVICE_GRIDS: &str = r#"[
        [["Device Information"], ["Device Name: WS-01"], ["Domain: ACME"]],
        [["Hardware"], ["Processor: Intel i7"]],
        [["Device Information"], ["Device Name: WS-02"]]
    ]"#;

    fn options() -> ReportIngestOptions {
        ReportIngestOptions {
            extract: ExtractOptions::default(),
            max_file_bytes: 1024 * 1024,
        }
    }

    #[tokio::test]
    async fn ingests_reports_and_records_failures() {
        let dir = TempDir::new();
        let report = dir.write("Detailed Computer Audit - ACME.json", TWO_DEVICE_GRIDS);
        let unsupported = dir.write("Patch Summary.json", "[]");
        let missing = dir.0.join("Detailed Computer Audit - missing.json");

        let db = rmm_audit_database::open_db(&dir.0.join("report.db"))
            .await
            .unwrap();

        let summary = ingest_reports(
            db.as_ref(),
            &[report.clone(), unsupported.clone(), missing.clone()],
            &options(),
            null_progress(),
        )
        .await
        .unwrap();

        assert_eq!(summary.files.len(), 3);
        assert_eq!(summary.devices_stored(), 2);

        let first = &summary.files[0];
        assert!(first.is_success());
        assert_eq!(first.template.as_deref(), Some("DETAILED_COMPUTER_AUDIT"));
        assert_eq!(first.devices_extracted, 2);

        let failed: Vec<&PathBuf> = summary.failed_files().into_iter().map(|f| &f.path).collect();
        assert_eq!(failed, vec![&unsupported, &missing]);
        assert!(
            summary.files[1]
                .error
                .as_deref()
                .unwrap()
                .contains("Unsupported report")
        );

        let devices = rmm_audit_database::get_devices(db.as_ref()).await.unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].domain.as_deref(), Some("ACME"));
    }

    #[tokio::test]
    async fn each_run_replaces_previous_data() {
        let dir = TempDir::new();
        let report = dir.write("Detailed Computer Audit.json", TWO_DEVICE_GRIDS);
        let db = rmm_audit_database::open_db(&dir.0.join("report.db"))
            .await
            .unwrap();

        for _ in 0..2 {
            ingest_reports(db.as_ref(), &[report.clone()], &options(), null_progress())
                .await
                .unwrap();
        }

        assert_eq!(rmm_audit_database::count_devices(db.as_ref()).await.unwrap(), 2);
    }

    #[test]
    fn oversized_reports_are_rejected() {
        let dir = TempDir::new();
        let report = dir.write("Detailed Computer Audit.json", TWO_DEVICE_GRIDS);

        let options = ReportIngestOptions {
            max_file_bytes: 16,
            ..options()
        };

        match extract_report(&report, &options) {
            Err(IngestError::FileTooLarge { size, limit, .. }) => {
                assert_eq!(limit, 16);
                assert!(size > 16);
            }
            other => panic!("expected FileTooLarge, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_site_fails_before_any_request() {
        let dir = TempDir::new();
        let db = rmm_audit_database::open_db(&dir.0.join("site.db"))
            .await
            .unwrap();

        let mut client = RmmClient::new(ApiCredentials {
            url: "http://127.0.0.1:9".to_string(),
            key: "key".to_string(),
            secret: "secret".to_string(),
        })
        .unwrap();

        let result = ingest_site(
            db.as_ref(),
            &mut client,
            &AppConfig::default(),
            "Nowhere",
            false,
            null_progress(),
        )
        .await;

        assert!(matches!(
            result,
            Err(IngestError::Config(ConfigError::UnknownSite(name))) if name == "Nowhere"
        ));
        assert!(!client.is_authenticated());
    }
}
