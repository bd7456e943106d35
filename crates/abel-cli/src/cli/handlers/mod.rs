//! Command handlers for the Abel CLI

pub mod auth;
pub mod config;
pub mod portal;
pub mod request;
