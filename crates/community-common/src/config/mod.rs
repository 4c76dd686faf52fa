//! Configuration structs

mod app_config;

pub use app_config::{
    AppConfig, AppSettings, ConfigError, Environment, PresenceConfig, RedisConfig,
    StorageBackend, StorageConfig, DEFAULT_DATE_FORMAT, HEARTBEAT_INTERVAL_MS,
    ONLINE_THRESHOLD_MS, RECOMPUTE_INTERVAL_MS,
};
