#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! TOML configuration for RMM audit ingestion.
//!
//! ```toml
//! database_path = "output/report_data.db"
//!
//! [api]
//! url = "https://merlot-api.centrastage.net"
//! key = "..."
//! secret = "..."
//!
//! [sites]
//! "Acme Corp" = "5f0c2f7e-..."
//! ```
//!
//! The file is located by an explicit path, then the `RMM_AUDIT_CONFIG`
//! environment variable, then `config.toml` in the working directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rmm_audit_api::ApiCredentials;
use rmm_audit_api_models::Site;
use serde::{Deserialize, Serialize};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "RMM_AUDIT_CONFIG";
/// Environment variable overriding `database_path`.
pub const DATABASE_PATH_ENV: &str = "RMM_AUDIT_DATABASE";
/// Environment variable overriding `api.key`.
pub const API_KEY_ENV: &str = "RMM_API_KEY";
/// Environment variable overriding `api.secret`.
pub const API_SECRET_ENV: &str = "RMM_API_SECRET";

/// Config file used when nothing else is specified.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Errors from loading or saving the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read or written.
    #[error("{}: {source}", path.display())]
    Io {
        /// Config file path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`AppConfig`].
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be rendered as TOML.
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A required `[api]` setting is empty.
    #[error("Missing API setting: api.{0}")]
    MissingApiSetting(&'static str),

    /// The requested site is not in `[sites]`.
    #[error("Unknown site: {0}")]
    UnknownSite(String),
}

/// RMM API connection settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the regional API host.
    pub url: String,
    pub key: String,
    pub secret: String,
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite database file.
    pub database_path: PathBuf,
    /// Largest report file accepted for extraction, in bytes.
    pub max_report_bytes: u64,
    pub api: ApiConfig,
    /// Site name to site UID.
    pub sites: BTreeMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("output/report_data.db"),
            max_report_bytes: 16 * 1024 * 1024,
            api: ApiConfig::default(),
            sites: BTreeMap::new(),
        }
    }
}

/// Picks the config file path: `explicit`, then `env_value`, then
/// [`DEFAULT_CONFIG_FILE`].
#[must_use]
pub fn resolve_path(explicit: Option<&Path>, env_value: Option<String>) -> PathBuf {
    explicit.map_or_else(
        || {
            env_value
                .filter(|value| !value.trim().is_empty())
                .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from)
        },
        Path::to_path_buf,
    )
}

impl AppConfig {
    /// Parses a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not a valid config.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses the config file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Like [`Self::load`], but a missing file yields the default config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read or
    /// parsed.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Writes the config to `path` as TOML, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(self)?;
        let io_err = |source: std::io::Error| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, text).map_err(io_err)?;

        log::info!("Wrote config to {}", path.display());
        Ok(())
    }

    /// Applies `RMM_AUDIT_DATABASE`, `RMM_API_KEY` and `RMM_API_SECRET`
    /// from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Applies overrides looked up through `lookup`. Empty values are
    /// ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(path) = get(DATABASE_PATH_ENV) {
            self.database_path = PathBuf::from(path);
        }
        if let Some(key) = get(API_KEY_ENV) {
            self.api.key = key;
        }
        if let Some(secret) = get(API_SECRET_ENV) {
            self.api.secret = secret;
        }
    }

    /// Configured site names, sorted.
    #[must_use]
    pub fn site_names(&self) -> Vec<&str> {
        self.sites.keys().map(String::as_str).collect()
    }

    /// Looks up the UID of a configured site.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownSite`] if `name` is not configured.
    pub fn site_uid(&self, name: &str) -> Result<&str, ConfigError> {
        self.sites
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ConfigError::UnknownSite(name.to_string()))
    }

    /// Replaces `[sites]` with `sites`. Later duplicates of a name win.
    pub fn set_sites(&mut self, sites: &[Site]) {
        let mut sorted: Vec<&Site> = sites.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));

        self.sites = sorted
            .into_iter()
            .map(|site| (site.name.clone(), site.uid.clone()))
            .collect();
    }

    /// Credentials for [`rmm_audit_api::RmmClient`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingApiSetting`] if the URL, key, or
    /// secret is empty.
    pub fn api_credentials(&self) -> Result<ApiCredentials, ConfigError> {
        let require = |value: &str, name: &'static str| {
            if value.trim().is_empty() {
                Err(ConfigError::MissingApiSetting(name))
            } else {
                Ok(value.trim().to_string())
            }
        };

        Ok(ApiCredentials {
            url: require(&self.api.url, "url")?,
            key: require(&self.api.key, "key")?,
            secret: require(&self.api.secret, "secret")?,
        })
    }
}
