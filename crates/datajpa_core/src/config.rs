//! Layered application configuration.
//!
//! # Responsibility
//! - Describe database, logging and paging settings in one serde shape.
//! - Merge built-in defaults, an optional TOML file and `DATAJPA__*`
//!   environment variables, in that priority order.
//!
//! # Invariants
//! - A loaded `AppConfig` has passed `validate()`.
//! - `database.path = None` selects an in-memory database.

use crate::logging::normalize_level;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "DATAJPA";
const ENV_SEPARATOR: &str = "__";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub paging: PagingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file path. In-memory when unset.
    pub path: Option<PathBuf>,
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of `trace|debug|info|warn|error`.
    pub level: String,
    /// Absolute directory for rolling log files. Logs go to stderr when unset.
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: crate::logging::default_log_level().to_string(),
            dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingConfig {
    /// Page size used when a caller asks for size `0`.
    pub default_page_size: u32,
    /// Requested sizes above this value are clamped.
    pub max_page_size: u32,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 50,
        }
    }
}

impl PagingConfig {
    /// Maps a requested page size onto the configured bounds.
    pub fn normalize_size(&self, requested: u32) -> u32 {
        match requested {
            0 => self.default_page_size,
            size if size > self.max_page_size => self.max_page_size,
            size => size,
        }
    }
}

impl AppConfig {
    /// Loads configuration from defaults, an optional TOML file and the
    /// process environment.
    pub fn load(file: Option<&Path>) -> ConfigResult<Self> {
        let mut builder = Self::defaults()?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .try_parsing(true),
        );

        Self::finish(builder)
    }

    /// Parses configuration from TOML text layered over defaults.
    ///
    /// Environment variables are not consulted.
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let builder = Self::defaults()?.add_source(File::from_str(source, FileFormat::Toml));
        Self::finish(builder)
    }

    /// Rejects settings the rest of the crate cannot honor.
    pub fn validate(&self) -> ConfigResult<()> {
        normalize_level(&self.logging.level).map_err(ConfigError::Invalid)?;

        if let Some(dir) = self.logging.dir.as_deref() {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "logging.dir must be an absolute path, got `{}`",
                    dir.display()
                )));
            }
        }

        let paging = &self.paging;
        if paging.default_page_size == 0 || paging.max_page_size == 0 {
            return Err(ConfigError::Invalid(
                "paging sizes must be greater than zero".to_string(),
            ));
        }
        if paging.default_page_size > paging.max_page_size {
            return Err(ConfigError::Invalid(format!(
                "paging.default_page_size {} exceeds paging.max_page_size {}",
                paging.default_page_size, paging.max_page_size
            )));
        }

        Ok(())
    }

    fn defaults() -> ConfigResult<config::ConfigBuilder<config::builder::DefaultState>> {
        let defaults = Self::default();
        let builder = Config::builder()
            .set_default(
                "database.busy_timeout_ms",
                defaults.database.busy_timeout_ms as i64,
            )?
            .set_default("logging.level", defaults.logging.level)?
            .set_default(
                "paging.default_page_size",
                i64::from(defaults.paging.default_page_size),
            )?
            .set_default(
                "paging.max_page_size",
                i64::from(defaults.paging.max_page_size),
            )?;
        Ok(builder)
    }

    fn finish(builder: config::ConfigBuilder<config::builder::DefaultState>) -> ConfigResult<Self> {
        let parsed: Self = builder.build()?.try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }
}
