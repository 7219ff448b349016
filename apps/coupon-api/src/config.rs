//! # API Configuration
//!
//! ## Load Order (later overrides earlier)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Defaults (ApiConfig::default)                                      │
//! │  2. TOML file: $COUPON_API_CONFIG, else ./coupon-api.toml (optional)   │
//! │  3. Environment variables                                              │
//! │  4. validate()                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Config File
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [database]
//! path = "coupons.db"
//! max_connections = 5
//!
//! [cache]
//! ttl_secs = 300
//! purge_interval_secs = 600
//!
//! [log]
//! filter = "info,coupon_service=debug"
//! ```
//!
//! ## Environment Overrides
//! | Variable                   | Key                         |
//! |----------------------------|-----------------------------|
//! | `COUPON_API_HOST`          | `server.host`               |
//! | `PORT`                     | `server.port`               |
//! | `DATABASE_PATH`            | `database.path`             |
//! | `DATABASE_MAX_CONNECTIONS` | `database.max_connections`  |
//! | `COUPON_CACHE_TTL_SECS`    | `cache.ttl_secs`            |
//! | `COUPON_CACHE_PURGE_SECS`  | `cache.purge_interval_secs` |
//! | `RUST_LOG`                 | `log.filter`                |

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Env var naming the config file.
pub const CONFIG_PATH_ENV: &str = "COUPON_API_CONFIG";

/// Config file used when `COUPON_API_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "coupon-api.toml";

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite file. Created on first start.
    pub path: PathBuf,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: PathBuf::from("coupons.db"),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Lifetime of a cached lookup.
    pub ttl_secs: u64,
    /// Janitor period. 0 disables the janitor (lazy expiry only).
    pub purge_interval_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            ttl_secs: 300,
            purge_interval_secs: 600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `tracing_subscriber::EnvFilter` directive string.
    pub filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            filter: "info".to_string(),
        }
    }
}

// =============================================================================
// ApiConfig
// =============================================================================

/// Complete server configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub log: LogSettings,
}

impl ApiConfig {
    /// Loads defaults, then the config file, then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        Self::load_with(&path, |key| std::env::var(key).ok())
    }

    /// Same as [`load`](Self::load) with an explicit file and variable source.
    pub fn load_with(
        path: &Path,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            debug!(?path, "Loading config file");
            let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            Self::from_toml(&contents)?
        } else {
            debug!(?path, "Config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides(var)?;
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML document. Missing keys keep their defaults.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Applies environment overrides from `var`.
    pub fn apply_env_overrides(
        &mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(host) = var("COUPON_API_HOST") {
            self.server.host = host;
        }
        if let Some(port) = parse_var(&var, "PORT")? {
            self.server.port = port;
        }
        if let Some(path) = var("DATABASE_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(max) = parse_var(&var, "DATABASE_MAX_CONNECTIONS")? {
            self.database.max_connections = max;
        }
        if let Some(ttl) = parse_var(&var, "COUPON_CACHE_TTL_SECS")? {
            self.cache.ttl_secs = ttl;
        }
        if let Some(every) = parse_var(&var, "COUPON_CACHE_PURGE_SECS")? {
            self.cache.purge_interval_secs = every;
        }
        if let Some(filter) = var("RUST_LOG") {
            self.log.filter = filter;
        }
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be greater than 0".into()));
        }
        if self.cache.ttl_secs == 0 {
            return Err(ConfigError::Invalid("cache.ttl_secs must be greater than 0".into()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// `host:port` to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }

    /// `None` when the janitor is disabled.
    pub fn purge_interval(&self) -> Option<Duration> {
        (self.cache.purge_interval_secs > 0)
            .then(|| Duration::from_secs(self.cache.purge_interval_secs))
    }
}

fn parse_var<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    match var(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
    }
}
