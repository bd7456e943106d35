//! # Abel Common
//!
//! Plumbing shared by every Abel Labs portal binary and library:
//! - Unified `tracing` subscriber setup
//! - Layered configuration loading (defaults, TOML file, environment)

pub mod config;
pub mod logging;

pub use config::{ConfigLoader, ConfigurationError};
