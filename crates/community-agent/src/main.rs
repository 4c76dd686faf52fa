//! Community presence agent entry point
//!
//! Run with:
//! ```bash
//! cargo run -p community-agent
//! ```
//!
//! Configuration is loaded from environment variables.

use community_common::{
    try_init_tracing, try_init_tracing_with_config, AppConfig, AppError, TracingConfig,
};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            let _ = try_init_tracing();
            let err = AppError::from(e);
            error!(error = %err, "Failed to load configuration");
            std::process::exit(err.exit_code());
        }
    };

    // Initialize tracing
    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        app = %config.app.name,
        env = ?config.app.env,
        backend = ?config.storage.backend,
        "Configuration loaded"
    );

    // Run the agent
    if let Err(e) = community_agent::run(config).await {
        error!(error = %e, code = e.error_code(), "Agent failed");
        std::process::exit(e.exit_code());
    }
}
