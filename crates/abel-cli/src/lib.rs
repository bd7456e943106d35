//! # Abel CLI
//!
//! Command-line client for the Abel Labs client portal.
//!
//! Every command talks to the portal through `abel-sdk`, so an expired access
//! token is refreshed and the call replayed without the user noticing. The
//! session is kept in the platform data directory between invocations.

pub mod cli;
pub mod config;
pub mod error;
pub mod output;

pub use cli::*;
pub use error::*;
