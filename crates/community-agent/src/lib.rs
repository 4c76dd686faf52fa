//! # community-agent
//!
//! Keeps the configured member marked online and periodically logs the
//! community directory as seen from the shared store.

pub mod agent;
pub mod store;

pub use agent::{log_snapshot, run, run_until};
pub use store::{connect_store, parse_seed};
