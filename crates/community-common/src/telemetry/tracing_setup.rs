//! Tracing and logging setup
//!
//! `RUST_LOG` wins when set; otherwise the preset's level applies to the
//! community crates and the Redis client stack is held at `warn`.

use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::Environment;

/// Crates whose chatter is capped at `warn` unless `RUST_LOG` says otherwise
const QUIET_CRATES: [&str; 2] = ["redis", "deadpool_redis"];

/// Tracing configuration options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Level for the community crates
    pub level: Level,
    /// One JSON object per line instead of human-readable output
    pub json: bool,
    /// Log span open/close, which shows `#[instrument]`ed service calls
    pub span_events: bool,
    /// Include file and line numbers
    pub file_line: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json: false,
            span_events: false,
            file_line: true,
        }
    }
}

impl TracingConfig {
    /// Pick the preset matching a deployment environment
    #[must_use]
    pub fn for_environment(env: Environment) -> Self {
        match env {
            Environment::Development => Self {
                level: Level::DEBUG,
                span_events: true,
                ..Self::default()
            },
            Environment::Staging => Self::default(),
            Environment::Production => Self {
                json: true,
                file_line: false,
                ..Self::default()
            },
        }
    }

    /// Filter directives used when `RUST_LOG` is absent
    fn default_directives(&self) -> String {
        let level = self.level.to_string().to_lowercase();
        QUIET_CRATES
            .iter()
            .fold(level, |directives, name| format!("{directives},{name}=warn"))
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.default_directives()))
    }

    /// Install the global subscriber
    pub fn install(&self) -> Result<(), TracingError> {
        let span_events = if self.span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };
        let layer = fmt::layer()
            .with_file(self.file_line)
            .with_line_number(self.file_line)
            .with_span_events(span_events);
        let registry = tracing_subscriber::registry().with(self.filter());

        let installed = if self.json {
            registry.with(layer.json()).try_init()
        } else {
            registry.with(layer).try_init()
        };
        installed.map_err(|_| TracingError::AlreadyInitialized)
    }
}

/// Install the default subscriber, used before configuration is known
pub fn try_init_tracing() -> Result<(), TracingError> {
    TracingConfig::default().install()
}

/// Install a subscriber for the given configuration
pub fn try_init_tracing_with_config(config: TracingConfig) -> Result<(), TracingError> {
    config.install()
}

/// Tracing initialization errors
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("Tracing subscriber already initialized")]
    AlreadyInitialized,
}
