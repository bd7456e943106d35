use crate::cli::{commands::Commands, handlers};
use crate::config::CliConfig;
use crate::error::Result;
use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::path::PathBuf;

/// Abel CLI - client portal from the terminal
#[derive(Parser, Debug)]
#[command(
    name = "abel",
    author = "Abel Labs",
    version,
    about = "Abel CLI - client portal from the terminal",
    long_about = "Command-line client for the Abel Labs client portal.

SESSION:
  abel login                        # Log in (prompts for email and password)
  abel status                       # Show session and token expiry
  abel logout                       # Forget the stored session

PORTAL:
  abel projects [ID]                # List projects or show one
  abel invoices [ID]                # List invoices or show one
  abel payments                     # Payment history
  abel checkout <INVOICE_ID>        # Start a hosted checkout

ANY ENDPOINT:
  abel request GET /projects        # Authenticated raw request

CONFIGURATION:
  abel config show                  # Show effective configuration"
)]
pub struct Args {
    /// Configuration file path (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Args {
    /// Execute the CLI command
    pub async fn run(self) -> Result<()> {
        let config = CliConfig::resolve(self.config.as_deref())?;
        let json = self.json;

        match self.command {
            // Session
            Commands::Login { email, password } => {
                handlers::auth::handle_login(email, password, &config).await
            }
            Commands::Register {
                email,
                name,
                password,
            } => handlers::auth::handle_register(email, name, password, &config).await,
            Commands::Logout => handlers::auth::handle_logout(&config),
            Commands::Status => handlers::auth::handle_status(&config, json),

            // Portal
            Commands::Request { method, path, data } => {
                handlers::request::handle_request(&method, &path, data.as_deref(), &config, json)
                    .await
            }
            Commands::Health => handlers::portal::handle_health(&config, json).await,
            Commands::Projects { id } => {
                handlers::portal::handle_projects(id.as_deref(), &config, json).await
            }
            Commands::Invoices { id } => {
                handlers::portal::handle_invoices(id.as_deref(), &config, json).await
            }
            Commands::Payments { status, provider } => {
                handlers::portal::handle_payments(status, provider, &config, json).await
            }
            Commands::Checkout {
                invoice_id,
                provider,
                success_url,
                cancel_url,
            } => {
                let options = handlers::portal::CheckoutOptions {
                    provider,
                    success_url,
                    cancel_url,
                };
                handlers::portal::handle_checkout(&invoice_id, options, &config, json).await
            }

            // Configuration
            Commands::Config { action } => {
                handlers::config::handle_config(action, self.config.as_deref(), &config, json)
            }
        }
    }
}
