//! # community-common
//!
//! Shared utilities including configuration, error handling, and telemetry.

pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use config::{
    AppConfig, AppSettings, ConfigError, Environment, PresenceConfig, RedisConfig,
    StorageBackend, StorageConfig, DEFAULT_DATE_FORMAT, HEARTBEAT_INTERVAL_MS,
    ONLINE_THRESHOLD_MS, RECOMPUTE_INTERVAL_MS,
};
pub use error::{AppError, AppResult};
pub use telemetry::{try_init_tracing, try_init_tracing_with_config, TracingConfig, TracingError};
