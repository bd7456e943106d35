//! Terminal output for portal commands
//!
//! Status lines go to stdout except failures, which go to stderr so that
//! `--json` output stays parseable.

pub mod progress;
pub mod table_output;

use crate::error::Result;
use console::{style, StyledObject};
use serde::Serialize;
use std::path::Path;

/// Print any serializable portal value as pretty JSON
pub fn json_output<T: Serialize + ?Sized>(data: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

fn status_line(marker: StyledObject<&str>, message: impl std::fmt::Display) -> String {
    format!("{marker} {message}")
}

pub fn print_success(message: &str) {
    println!("{}", status_line(style("✔").green().bold(), message));
}

pub fn print_error(message: &str) {
    eprintln!(
        "{}",
        status_line(style("✘").red().bold(), style(message).red())
    );
}

pub fn print_info(message: &str) {
    println!("{}", status_line(style("•").cyan(), message));
}

/// Print a URL the user is expected to open, e.g. a checkout page
pub fn print_link(label: &str, url: &str) {
    println!(
        "{}",
        status_line(style("↗").magenta(), format!("{label}: {}", style(url).underlined()))
    );
}

/// Shorten paths under the home directory to `~/...`
pub fn compress_path(path: &Path) -> String {
    etcetera::home_dir()
        .ok()
        .and_then(|home| {
            path.strip_prefix(&home)
                .ok()
                .map(|rest| format!("~/{}", rest.display()))
        })
        .unwrap_or_else(|| path.display().to_string())
}
