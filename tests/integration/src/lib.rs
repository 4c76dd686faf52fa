//! Integration test utilities for the community presence workspace
//!
//! This crate provides a simulated set of browser-like contexts sharing one
//! store, plus fixtures for users and messages.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
