use abel_sdk::PaymentProvider;
use clap::Subcommand;

/// Main CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in to the portal
    Login {
        /// Account email (prompted when omitted)
        #[arg(long)]
        email: Option<String>,

        /// Account password (prompted when omitted)
        #[arg(long, env = "ABEL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create a portal account and log in
    Register {
        /// Account email (prompted when omitted)
        #[arg(long)]
        email: Option<String>,

        /// Display name (prompted when omitted)
        #[arg(long)]
        name: Option<String>,

        /// Account password (prompted when omitted)
        #[arg(long, env = "ABEL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show session status without contacting the portal
    Status,

    /// Send an authenticated request to any API path
    Request {
        /// HTTP method, e.g. GET or POST
        method: String,

        /// Path relative to the API base URL, e.g. /projects
        path: String,

        /// JSON request body
        #[arg(long, short = 'd')]
        data: Option<String>,
    },

    /// Check that the portal API is up
    Health,

    /// List projects, or show one
    Projects {
        /// Project ID
        id: Option<String>,
    },

    /// List invoices, or show one with its line items
    Invoices {
        /// Invoice ID
        id: Option<String>,
    },

    /// Show payment history
    Payments {
        /// Only payments with this status, e.g. COMPLETED
        #[arg(long)]
        status: Option<String>,

        /// Only payments through this provider
        #[arg(long)]
        provider: Option<PaymentProvider>,
    },

    /// Start a hosted checkout for an invoice
    Checkout {
        /// Invoice ID
        invoice_id: String,

        /// Payment provider (STRIPE, CHAPA or TELEBIRR)
        #[arg(long)]
        provider: Option<PaymentProvider>,

        /// Where the provider redirects after payment
        #[arg(long)]
        success_url: Option<String>,

        /// Where the provider redirects after cancelling
        #[arg(long)]
        cancel_url: Option<String>,
    },

    /// Manage CLI configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Print the configuration file location
    Path,
}
