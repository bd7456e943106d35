//! Main entry point for the Abel CLI

use abel_cli::{cli::Args, output::print_error};
use clap::Parser;
use clap_verbosity_flag::LevelFilter;
use color_eyre::eyre::{eyre, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Configure color-eyre without file locations
    color_eyre::config::HookBuilder::default()
        .display_location_section(false)
        .display_env_section(false)
        .install()?;

    match args.verbosity.log_level_filter() {
        LevelFilter::Off | LevelFilter::Error | LevelFilter::Warn => {}
        _ => {
            std::env::set_var("RUST_LIB_BACKTRACE", "1");
        }
    }

    // Quiet unless -v/-q or RUST_LOG asks for logs
    let binary_name = env!("CARGO_BIN_NAME").replace('-', "_");
    let default_filter = format!("{binary_name}=warn,abel_cli=warn,abel_sdk=warn");
    abel_common::logging::init_cli_logging(&args.verbosity, &default_filter)
        .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

    if let Err(e) = args.run().await {
        if let Some(suggestion) = e.suggestion() {
            print_error(suggestion);
        }
        return Err(e.into());
    }
    Ok(())
}
