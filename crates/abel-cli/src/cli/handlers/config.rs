//! Configuration command handlers

use crate::cli::commands::ConfigAction;
use crate::config::CliConfig;
use crate::error::Result;
use crate::output::{compress_path, json_output, print_info};
use abel_common::ConfigLoader;
use std::path::Path;

/// Handle config subcommands
pub fn handle_config(
    action: ConfigAction,
    explicit_path: Option<&Path>,
    config: &CliConfig,
    json: bool,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            if json {
                return json_output(config);
            }
            print!("{}", config.to_toml()?);
            Ok(())
        }
        ConfigAction::Path => {
            let path = match explicit_path {
                Some(path) => path.to_path_buf(),
                None => CliConfig::default_config_path()?,
            };
            if json {
                return json_output(&serde_json::json!({
                    "path": path,
                    "exists": path.exists(),
                }));
            }

            println!("{}", compress_path(&path));
            if !path.exists() {
                print_info("File does not exist; defaults and ABEL_* environment variables apply");
            }
            Ok(())
        }
    }
}
