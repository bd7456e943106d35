//! Spinners for network calls

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Start a spinner with the given message
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

pub fn complete_spinner_and_clear(spinner: ProgressBar) {
    spinner.finish_and_clear();
}

/// Stop the spinner and leave a failure line in its place
pub fn complete_spinner_error(spinner: ProgressBar, message: &str) {
    spinner.finish_with_message(format!("{} {}", style("✗").red().bold(), message));
}
