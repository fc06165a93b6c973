#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for RMM audit ingestion.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rmm_audit_api::RmmClient;
use rmm_audit_cli_utils::IndicatifProgress;
use rmm_audit_config::{AppConfig, CONFIG_PATH_ENV, resolve_path};
use rmm_audit_ingest::{ReportIngestOptions, ingest_reports, ingest_site, update_sites};
use rmm_audit_report::{GroupingMode, PdfGridOptions};

#[derive(Parser)]
#[command(name = "rmm_audit_ingest", about = "RMM audit report and API ingestion tool")]
struct Cli {
    /// Config file (overrides `RMM_AUDIT_CONFIG`)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// `SQLite` database file (overrides the config and `RMM_AUDIT_DATABASE`)
    #[arg(long, global = true)]
    database: Option<PathBuf>,
    /// Leading PDF pages to skip before reading tables
    #[arg(long, global = true, default_value = "1")]
    skip_pages: usize,
    /// Group every N tables into one device instead of splitting on
    /// "Device Information" headers
    #[arg(long, global = true)]
    chunk_size: Option<NonZeroUsize>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace the database contents with devices from report files
    Reports {
        /// Report files (PDF or JSON grids)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Replace the database contents with a site's devices from the API
    Site {
        /// Configured site name; prompts when omitted
        name: Option<String>,
        /// Also fetch and store each device's hardware audit
        #[arg(long)]
        audits: bool,
    },
    /// List configured sites
    Sites,
    /// Refresh the configured sites from the API
    UpdateSites,
    /// Print the devices extracted from one report without storing them
    Extract {
        file: PathBuf,
        /// Print full records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Drop and recreate every table
    Reset,
}

impl Cli {
    fn report_options(&self, config: &AppConfig) -> ReportIngestOptions {
        let mut options = ReportIngestOptions::from_config(config);
        options.extract.pdf = PdfGridOptions {
            skip_pages: self.skip_pages,
        };
        if let Some(n) = self.chunk_size {
            options.extract.grouping = GroupingMode::FixedChunks(n);
        }
        options
    }
}

#[tokio::main]
#[allow(clippy::too_many_lines)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = rmm_audit_cli_utils::init_logger();

    let cli = Cli::parse();

    let config_path = resolve_path(cli.config.as_deref(), std::env::var(CONFIG_PATH_ENV).ok());
    let mut config = AppConfig::load_or_default(&config_path)?;
    config.apply_env_overrides();
    if let Some(database) = &cli.database {
        config.database_path.clone_from(database);
    }

    match &cli.command {
        Commands::Reports { files } => {
            let db = rmm_audit_database::open_db(&config.database_path).await?;
            let progress = IndicatifProgress::files_bar(&multi, "Reports", files.len() as u64);

            let summary =
                ingest_reports(db.as_ref(), files, &cli.report_options(&config), progress).await?;

            for file in summary.failed_files() {
                println!(
                    "FAILED {}: {}",
                    file.path.display(),
                    file.error.as_deref().unwrap_or("unknown error")
                );
            }
            println!(
                "Stored {} device(s) from {} file(s) into {}",
                summary.devices_stored(),
                summary.files.len(),
                config.database_path.display()
            );
        }
        Commands::Site { name, audits } => {
            let name = match name {
                Some(name) => name.clone(),
                None => {
                    let Some(name) = rmm_audit_cli_utils::prompt_site(&config.site_names())?
                    else {
                        log::error!(
                            "No sites configured in {}; run update-sites first",
                            config_path.display()
                        );
                        return Ok(());
                    };
                    name
                }
            };

            let mut client = RmmClient::new(config.api_credentials()?)?;
            let db = rmm_audit_database::open_db(&config.database_path).await?;
            let progress = IndicatifProgress::devices_bar(&multi, &name);

            let summary =
                ingest_site(db.as_ref(), &mut client, &config, &name, *audits, progress).await?;

            println!(
                "{}: fetched {}, stored {}, skipped {}, failed {}",
                summary.site_name,
                summary.devices_fetched,
                summary.devices_stored,
                summary.devices_skipped,
                summary.devices_failed
            );
            if *audits {
                println!(
                    "Audits: stored {}, failed {}",
                    summary.audits_stored, summary.audits_failed
                );
            }
        }
        Commands::Sites => {
            if config.sites.is_empty() {
                println!("No sites configured in {}", config_path.display());
            }
            for (name, uid) in &config.sites {
                println!("  {name:<40} {uid}");
            }
        }
        Commands::UpdateSites => {
            let mut client = RmmClient::new(config.api_credentials()?)?;
            let count = update_sites(&mut client, &mut config, &config_path).await?;
            println!("Saved {count} site(s) to {}", config_path.display());
        }
        Commands::Extract { file, json } => {
            let progress =
                IndicatifProgress::devices_bar(&multi, &format!("Extracting {}", file.display()));
            let extracted = rmm_audit_ingest::extract_report(file, &cli.report_options(&config));
            progress.finish_and_clear();
            let (template, records) = extracted?;

            if *json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                println!("{} ({template}): {} device(s)", file.display(), records.len());
                for record in &records {
                    println!(
                        "  {:<30} {:<20} {} disk(s)",
                        record.device.device_name,
                        record.device.domain,
                        record.storage.len()
                    );
                }
            }
        }
        Commands::Reset => {
            let db = rmm_audit_database::open_db(&config.database_path).await?;
            rmm_audit_database::reset_schema(db.as_ref()).await?;
            log::info!("Reset {}", config.database_path.display());
        }
    }

    Ok(())
}
