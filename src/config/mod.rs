//! Unified configuration for relsentry.
//!
//! Configuration is loaded with precedence: overrides > Env vars > Config file > Defaults
//!
//! # Example config file (relsentry.toml)
//! ```toml
//! data_dir = "extracts/latest"
//! definitions_path = "config/definitions.json"
//!
//! [report]
//! reports_dir = "artifacts/reports"
//! top_accounts = 10
//! ```

mod defaults;

pub use defaults::*;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for relsentry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SentryConfig {
    /// Directory holding one `<kind>.csv` per entity kind
    pub data_dir: PathBuf,
    /// Path of the persisted rule definition list (JSON)
    pub definitions_path: PathBuf,
    /// Report rendering options
    pub report: ReportConfig,
    /// SOL referent rule labels
    pub sol: SolConfig,
}

impl Default for SentryConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            definitions_path: PathBuf::from(DEFAULT_DEFINITIONS_PATH),
            report: ReportConfig::default(),
            sol: SolConfig::default(),
        }
    }
}

impl SentryConfig {
    /// Load configuration with precedence: overrides > Env > File > Defaults
    ///
    /// # Arguments
    /// * `config_path` - Optional path to TOML config file
    /// * `overrides` - Programmatic overrides to apply on top
    pub fn load(
        config_path: Option<&str>,
        overrides: ConfigOverrides,
    ) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(SentryConfig::default()));

        // Layer 1: Config file (if provided)
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Layer 2: Environment variables with RELSENTRY_ prefix
        // (RELSENTRY_REPORT__TOP_ACCOUNTS -> report.top_accounts)
        figment = figment.merge(Env::prefixed("RELSENTRY_").split("__"));

        // Layer 3: Programmatic overrides
        figment = figment.merge(Serialized::defaults(overrides));

        figment.extract().map_err(ConfigError::from)
    }

    /// Load from environment and optional config file only (no overrides)
    pub fn from_env(config_path: Option<&str>) -> Result<Self, ConfigError> {
        Self::load(config_path, ConfigOverrides::default())
    }
}

/// Report rendering options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory for report artifacts
    pub reports_dir: PathBuf,
    /// Accounts shown in the top-accounts ranking
    pub top_accounts: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            reports_dir: PathBuf::from(DEFAULT_REPORTS_DIR),
            top_accounts: DEFAULT_TOP_ACCOUNTS,
        }
    }
}

/// Labels used by the SOL referent email rule defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolConfig {
    /// Role label identifying SOL referents
    pub role: String,
    /// Contact-point type a SOL referent must carry
    pub email_type: String,
}

impl Default for SolConfig {
    fn default() -> Self {
        Self {
            role: DEFAULT_SOL_ROLE.to_string(),
            email_type: DEFAULT_SOL_EMAIL_TYPE.to_string(),
        }
    }
}

/// Programmatic overrides that take precedence over file and env config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definitions_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportOverrides>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reports_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_accounts: Option<usize>,
}

/// Configuration error.
#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        Self {
            message: e.to_string(),
        }
    }
}
