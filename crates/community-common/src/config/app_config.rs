//! Application configuration structs
//!
//! Loads configuration from environment variables.

use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;
use std::env;
use std::time::Duration;

/// A member counts as online when seen within this window (5 minutes)
pub const ONLINE_THRESHOLD_MS: u64 = 300_000;
/// Online set recompute period (30 seconds)
pub const RECOMPUTE_INTERVAL_MS: u64 = 30_000;
/// Current-user heartbeat period (2 minutes)
pub const HEARTBEAT_INTERVAL_MS: u64 = 120_000;
/// chrono format used for "last activity" dates
pub const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub presence: PresenceConfig,
    pub storage: StorageConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Presence timing configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PresenceConfig {
    #[serde(default = "default_online_threshold")]
    pub online_threshold_ms: u64,
    #[serde(default = "default_recompute_interval")]
    pub recompute_interval_ms: u64,
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_ms: u64,
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            online_threshold_ms: default_online_threshold(),
            recompute_interval_ms: default_recompute_interval(),
            heartbeat_interval_ms: default_heartbeat_interval(),
            date_format: default_date_format(),
        }
    }
}

impl PresenceConfig {
    #[must_use]
    pub fn online_threshold(&self) -> Duration {
        Duration::from_millis(self.online_threshold_ms)
    }

    #[must_use]
    pub fn recompute_interval(&self) -> Duration {
        Duration::from_millis(self.recompute_interval_ms)
    }

    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    /// Threshold in signed milliseconds, for arithmetic against epoch-ms markers
    #[must_use]
    pub fn threshold_ms(&self) -> i64 {
        i64::try_from(self.online_threshold_ms).unwrap_or(i64::MAX)
    }

    /// Reject zero-length windows and periods
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.online_threshold_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "PRESENCE_ONLINE_THRESHOLD_MS",
                "must be greater than zero".to_string(),
            ));
        }
        if self.recompute_interval_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "PRESENCE_RECOMPUTE_INTERVAL_MS",
                "must be greater than zero".to_string(),
            ));
        }
        if self.heartbeat_interval_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "PRESENCE_HEARTBEAT_INTERVAL_MS",
                "must be greater than zero".to_string(),
            ));
        }
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::InvalidValue(
                "PRESENCE_DATE_FORMAT",
                format!("'{}' is not a valid date format", self.date_format),
            ));
        }
        Ok(())
    }
}

/// Which storage backend to connect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Redis,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default)]
    pub redis: Option<RedisConfig>,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// JSON object of key/value pairs preloaded into the memory backend
    #[serde(default)]
    pub seed_file: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            redis: None,
            key_prefix: default_key_prefix(),
            seed_file: None,
        }
    }
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    #[serde(default = "default_redis_max_connections")]
    pub max_connections: u32,
}

// Default value functions
fn default_app_name() -> String {
    "community".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_online_threshold() -> u64 {
    ONLINE_THRESHOLD_MS
}

fn default_recompute_interval() -> u64 {
    RECOMPUTE_INTERVAL_MS
}

fn default_heartbeat_interval() -> u64 {
    HEARTBEAT_INTERVAL_MS
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

fn default_key_prefix() -> String {
    "community:".to_string()
}

fn default_redis_max_connections() -> u32 {
    10
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a required variable is missing or a value is invalid
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match lookup("STORAGE_BACKEND") {
            None => StorageBackend::default(),
            Some(s) => match s.to_lowercase().as_str() {
                "memory" => StorageBackend::Memory,
                "redis" => StorageBackend::Redis,
                other => {
                    return Err(ConfigError::InvalidValue(
                        "STORAGE_BACKEND",
                        format!("unknown backend {other:?}"),
                    ))
                }
            },
        };

        let redis = match (backend, lookup("REDIS_URL")) {
            (_, Some(url)) => Some(RedisConfig {
                url,
                max_connections: parse_or(&lookup, "REDIS_MAX_CONNECTIONS", default_redis_max_connections)?,
            }),
            (StorageBackend::Redis, None) => return Err(ConfigError::MissingVar("REDIS_URL")),
            (StorageBackend::Memory, None) => None,
        };

        let presence = PresenceConfig {
            online_threshold_ms: parse_or(&lookup, "PRESENCE_ONLINE_THRESHOLD_MS", default_online_threshold)?,
            recompute_interval_ms: parse_or(&lookup, "PRESENCE_RECOMPUTE_INTERVAL_MS", default_recompute_interval)?,
            heartbeat_interval_ms: parse_or(&lookup, "PRESENCE_HEARTBEAT_INTERVAL_MS", default_heartbeat_interval)?,
            date_format: lookup("PRESENCE_DATE_FORMAT").unwrap_or_else(default_date_format),
        };
        presence.validate()?;

        Ok(Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env: lookup("APP_ENV")
                    .and_then(|s| match s.to_lowercase().as_str() {
                        "production" => Some(Environment::Production),
                        "staging" => Some(Environment::Staging),
                        "development" => Some(Environment::Development),
                        _ => None,
                    })
                    .unwrap_or_default(),
            },
            presence,
            storage: StorageConfig {
                backend,
                redis,
                key_prefix: lookup("STORAGE_KEY_PREFIX").unwrap_or_else(default_key_prefix),
                seed_file: lookup("STORAGE_SEED_FILE"),
            },
        })
    }
}

/// Parse a numeric variable, falling back to its default when unset
fn parse_or<F, T>(lookup: &F, name: &'static str, default: fn() -> T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        None => Ok(default()),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name, raw)),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
