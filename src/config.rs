//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::aggregate::{default_category_rules, CategoryRule};
use crate::chart::RasterOptions;
use crate::client::{ClientConfig, DEFAULT_AUTH_SCHEME, DEFAULT_BASE_URL};
use crate::export::{ExportConfig, PageGeometry};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub report: ReportConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Theme keyword sets for the category chart
    #[serde(default = "default_category_rules")]
    pub categories: Vec<CategoryRule>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend connection
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_auth_scheme")]
    pub auth_scheme: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_auth_scheme() -> String {
    DEFAULT_AUTH_SCHEME.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            auth_scheme: default_auth_scheme(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Where the session token is kept
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("ecocat").to_string_lossy().to_string())
        .unwrap_or_else(|| "./ecocat_data".to_string())
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// PDF report settings
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Physical pixels per logical chart pixel
    #[serde(default = "default_oversampling")]
    pub oversampling: u32,

    /// Prefix of every report title
    #[serde(default = "default_report_title")]
    pub title: String,
}

fn default_output_dir() -> String {
    ".".to_string()
}

fn default_oversampling() -> u32 {
    2
}

fn default_report_title() -> String {
    "Environmental Dataset Catalogue".to_string()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            oversampling: default_oversampling(),
            title: default_report_title(),
        }
    }
}

/// Catalogue presentation
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Rows shown by the list table
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,
}

fn default_list_limit() -> usize {
    50
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            list_limit: default_list_limit(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Expand a leading `~/` to the home directory
pub fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Parse TOML text
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("ecocat").join("config.toml")),
            Some(PathBuf::from("/etc/ecocat/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::debug!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("ECOCAT_API_URL") {
            self.api.base_url = url;
        }
        if let Some(data_dir) = lookup("ECOCAT_DATA_DIR") {
            self.session.data_dir = data_dir;
        }
        if let Some(output_dir) = lookup("ECOCAT_OUTPUT_DIR") {
            self.report.output_dir = output_dir;
        }
        if let Some(level) = lookup("ECOCAT_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("ECOCAT_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Reject values that cannot work
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api.base_url must not be empty".to_string()));
        }
        if self.report.oversampling == 0 {
            return Err(ConfigError::Invalid("report.oversampling must be at least 1".to_string()));
        }
        if self.catalog.list_limit == 0 {
            return Err(ConfigError::Invalid("catalog.list_limit must be at least 1".to_string()));
        }
        if let Some(rule) = self.categories.iter().find(|r| r.keywords.is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "category '{}' has no keywords",
                rule.name
            )));
        }
        Ok(())
    }

    pub fn data_dir(&self) -> PathBuf {
        expand_home(&self.session.data_dir)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api.base_url.clone(),
            auth_scheme: self.api.auth_scheme.clone(),
            request_timeout_secs: self.api.request_timeout_secs,
        }
    }

    pub fn export_config(&self) -> ExportConfig {
        ExportConfig {
            output_dir: expand_home(&self.report.output_dir),
            raster: RasterOptions {
                oversampling: self.report.oversampling,
                ..RasterOptions::default()
            },
            geometry: PageGeometry::a4(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            session: SessionConfig::default(),
            report: ReportConfig::default(),
            catalog: CatalogConfig::default(),
            categories: default_category_rules(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    let mut out = String::from(
        r#"# ecocat Configuration
#
# Environment variables override these settings:
# - ECOCAT_API_URL
# - ECOCAT_DATA_DIR
# - ECOCAT_OUTPUT_DIR
# - ECOCAT_LOG_LEVEL
# - ECOCAT_LOG_FORMAT

[api]
# Catalogue backend base URL
base_url = "http://127.0.0.1:8000/"

# Authorization header scheme ("Token" for DRF token auth, "Bearer" for JWT)
auth_scheme = "Token"

# Request timeout in seconds
request_timeout_secs = 30

[session]
# Directory holding session.json
data_dir = "~/.local/share/ecocat"

[report]
# Directory PDF reports are written to
output_dir = "."

# Chart oversampling factor
oversampling = 2

# Report title prefix
title = "Environmental Dataset Catalogue"

[catalog]
# Rows shown by `ecocat list`
list_limit = 50

[logging]
# Log level: trace, debug, info, warn, error
level = "warn"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Theme categories: a dataset counts towards every category one of whose
# keywords appears in its title (case-insensitive); others count as "Other".
"#,
    );

    for rule in default_category_rules() {
        let keywords: Vec<String> = rule.keywords.iter().map(|k| format!("{:?}", k)).collect();
        out.push_str(&format!(
            "\n[[categories]]\nname = {:?}\nkeywords = [{}]\n",
            rule.name,
            keywords.join(", ")
        ));
    }
    out
}
