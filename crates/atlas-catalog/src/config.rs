//! # Catalog Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     ATLAS_DATABASE_PATH=/var/lib/atlas/catalog.db                      │
//! │     ATLAS_MAX_CONNECTIONS=8                                            │
//! │     ATLAS_LOG_FILTER=info,atlas=trace                                  │
//! │     ATLAS_SKU_SEGMENT_MAX_LEN=10                                       │
//! │     ATLAS_MAX_MATRIX_COMBINATIONS=10000                                │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/atlas-catalog/catalog.toml (Linux)                       │
//! │     ~/Library/Application Support/com.atlas.catalog/catalog.toml       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "catalog.db"
//! max_connections = 5
//! min_connections = 1
//! connect_timeout_secs = 30
//!
//! [logging]
//! filter = "info,atlas=debug,sqlx=warn"
//!
//! [variants]
//! sku_segment_max_len = 10
//! max_matrix_combinations = 10000
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use atlas_core::{DEFAULT_MAX_MATRIX_COMBINATIONS, DEFAULT_SKU_SEGMENT_LEN};
use atlas_db::DbConfig;

/// Errors raised while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// `[database]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Created on first connect.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_database_path() -> PathBuf {
    directories::ProjectDirs::from("com", "atlas", "catalog")
        .map(|dirs| dirs.data_dir().join("catalog.db"))
        .unwrap_or_else(|| PathBuf::from("catalog.db"))
}

fn default_max_connections() -> u32 {
    5
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    30
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_database_path(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "info,atlas=debug,sqlx=warn".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_log_filter(),
        }
    }
}

/// `[variants]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantSettings {
    /// Characters kept from each axis value in a generated SKU.
    #[serde(default = "default_segment_len")]
    pub sku_segment_max_len: usize,

    /// Matrix generation is refused above this many combinations.
    #[serde(default = "default_max_combinations")]
    pub max_matrix_combinations: usize,
}

fn default_segment_len() -> usize {
    DEFAULT_SKU_SEGMENT_LEN
}

fn default_max_combinations() -> usize {
    DEFAULT_MAX_MATRIX_COMBINATIONS
}

impl Default for VariantSettings {
    fn default() -> Self {
        VariantSettings {
            sku_segment_max_len: default_segment_len(),
            max_matrix_combinations: default_max_combinations(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete catalog configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub logging: LoggingSettings,

    #[serde(default)]
    pub variants: VariantSettings,
}

impl CatalogConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (catalog.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading catalog config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns defaults if loading fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load catalog config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Writes the configuration as TOML.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::Invalid("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Catalog config saved");
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }
        if self.database.min_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.min_connections must be greater than 0".into(),
            ));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid(format!(
                "database.min_connections ({}) exceeds max_connections ({})",
                self.database.min_connections, self.database.max_connections
            )));
        }
        if self.variants.sku_segment_max_len == 0 {
            return Err(ConfigError::Invalid(
                "variants.sku_segment_max_len must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("ATLAS_DATABASE_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Ok(max) = std::env::var("ATLAS_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %max, "Ignoring invalid ATLAS_MAX_CONNECTIONS"),
            }
        }

        if let Ok(filter) = std::env::var("ATLAS_LOG_FILTER") {
            self.logging.filter = filter;
        }

        if let Ok(len) = std::env::var("ATLAS_SKU_SEGMENT_MAX_LEN") {
            match len.parse::<usize>() {
                Ok(n) => self.variants.sku_segment_max_len = n,
                Err(_) => warn!(value = %len, "Ignoring invalid ATLAS_SKU_SEGMENT_MAX_LEN"),
            }
        }

        if let Ok(max) = std::env::var("ATLAS_MAX_MATRIX_COMBINATIONS") {
            match max.parse::<usize>() {
                Ok(n) => self.variants.max_matrix_combinations = n,
                Err(_) => warn!(value = %max, "Ignoring invalid ATLAS_MAX_MATRIX_COMBINATIONS"),
            }
        }
    }

    /// `<config dir>/catalog.toml` for this platform.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "atlas", "catalog")
            .map(|dirs| dirs.config_dir().join("catalog.toml"))
    }

    /// Pool settings for [`atlas_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database.path.clone())
            .max_connections(self.database.max_connections)
            .min_connections(self.database.min_connections)
            .connect_timeout(Duration::from_secs(self.database.connect_timeout_secs))
    }
}
