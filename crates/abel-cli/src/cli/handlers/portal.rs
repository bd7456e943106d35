//! Project, invoice and payment handlers

use crate::config::CliConfig;
use crate::error::Result;
use crate::output::progress::{complete_spinner_and_clear, complete_spinner_error, create_spinner};
use crate::output::table_output::{
    display_invoice_details, display_invoices, display_payments, display_projects,
};
use crate::output::{json_output, print_error, print_info, print_link, print_success};
use abel_sdk::{CreateCheckoutRequest, PaymentHistoryQuery, PaymentProvider};
use std::future::Future;

/// Run `call` behind a spinner unless JSON output was requested
async fn with_spinner<T, F>(message: &str, json: bool, call: F) -> Result<T>
where
    F: Future<Output = abel_sdk::Result<T>>,
{
    if json {
        return Ok(call.await?);
    }

    let spinner = create_spinner(message);
    match call.await {
        Ok(value) => {
            complete_spinner_and_clear(spinner);
            Ok(value)
        }
        Err(e) => {
            complete_spinner_error(spinner, "Request failed");
            Err(e.into())
        }
    }
}

/// Handle health command
pub async fn handle_health(config: &CliConfig, json: bool) -> Result<()> {
    let client = config.build_client()?;
    let health = with_spinner("Checking portal health...", json, client.health_check()).await?;

    if json {
        return json_output(&health);
    }

    if health.is_healthy() {
        print_success(&format!("Portal is up ({})", client.base_url()));
    } else {
        print_error(&format!(
            "Portal reports '{}': {}",
            health.status,
            health.error.as_deref().unwrap_or("no details")
        ));
    }
    if let Some(database) = &health.database {
        print_info(&format!("Database: {database}"));
    }
    Ok(())
}

/// Handle projects command
pub async fn handle_projects(id: Option<&str>, config: &CliConfig, json: bool) -> Result<()> {
    let client = config.build_client()?;

    let projects = match id {
        Some(id) => vec![with_spinner("Fetching project...", json, client.get_project(id)).await?],
        None => with_spinner("Fetching projects...", json, client.list_projects()).await?,
    };

    if json {
        return match id {
            Some(_) => json_output(&projects[0]),
            None => json_output(&projects),
        };
    }

    if projects.is_empty() {
        print_info("No projects yet");
        return Ok(());
    }
    display_projects(&projects);
    Ok(())
}

/// Handle invoices command
pub async fn handle_invoices(id: Option<&str>, config: &CliConfig, json: bool) -> Result<()> {
    let client = config.build_client()?;

    if let Some(id) = id {
        let invoice = with_spinner("Fetching invoice...", json, client.get_invoice(id)).await?;
        if json {
            return json_output(&invoice);
        }
        display_invoice_details(&invoice);
        return Ok(());
    }

    let invoices = with_spinner("Fetching invoices...", json, client.list_invoices()).await?;
    if json {
        return json_output(&invoices);
    }

    if invoices.is_empty() {
        print_info("No invoices");
        return Ok(());
    }
    display_invoices(&invoices);
    Ok(())
}

/// Handle payments command
pub async fn handle_payments(
    status: Option<String>,
    provider: Option<PaymentProvider>,
    config: &CliConfig,
    json: bool,
) -> Result<()> {
    let client = config.build_client()?;
    let query = PaymentHistoryQuery { status, provider };

    let payments =
        with_spinner("Fetching payment history...", json, client.payment_history(&query)).await?;
    if json {
        return json_output(&payments);
    }

    if payments.is_empty() {
        print_info("No payments found");
        return Ok(());
    }
    display_payments(&payments);
    Ok(())
}

/// Optional checkout settings
#[derive(Debug, Default)]
pub struct CheckoutOptions {
    pub provider: Option<PaymentProvider>,
    pub success_url: Option<String>,
    pub cancel_url: Option<String>,
}

/// Handle checkout command
pub async fn handle_checkout(
    invoice_id: &str,
    options: CheckoutOptions,
    config: &CliConfig,
    json: bool,
) -> Result<()> {
    let client = config.build_client()?;
    let request = CreateCheckoutRequest {
        invoice_id: invoice_id.to_string(),
        success_url: options.success_url,
        cancel_url: options.cancel_url,
        provider: options.provider,
    };

    let session =
        with_spinner("Creating checkout session...", json, client.create_checkout(&request)).await?;
    if json {
        return json_output(&session);
    }

    print_success(&format!("Checkout session created with {}", session.provider));
    print_link("Pay at", &session.payment_url);
    if let Some(expires_at) = session.expires_at {
        print_info(&format!("Link expires at {}", expires_at.to_rfc3339()));
    }
    Ok(())
}
