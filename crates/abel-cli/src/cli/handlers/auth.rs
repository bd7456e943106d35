//! Authentication command handlers

use crate::config::CliConfig;
use crate::error::Result;
use crate::output::progress::{complete_spinner_and_clear, complete_spinner_error, create_spinner};
use crate::output::{json_output, print_info, print_success};
use abel_sdk::UserProfile;
use chrono::Local;
use dialoguer::{Input, Password};
use tracing::debug;

fn prompt_email(email: Option<String>) -> Result<String> {
    match email {
        Some(email) => Ok(email),
        None => Ok(Input::<String>::new().with_prompt("Email").interact_text()?),
    }
}

/// Handle login command
pub async fn handle_login(
    email: Option<String>,
    password: Option<String>,
    config: &CliConfig,
) -> Result<()> {
    let email = prompt_email(email)?;
    let password = match password {
        Some(password) => password,
        None => Password::new().with_prompt("Password").interact()?,
    };

    let client = config.build_client()?;
    debug!("Logging in to {}", client.base_url());

    let spinner = create_spinner("Logging in...");
    let user = match client.login(&email, &password).await {
        Ok(user) => {
            complete_spinner_and_clear(spinner);
            user
        }
        Err(e) => {
            complete_spinner_error(spinner, "Login failed");
            return Err(e.into());
        }
    };

    print_welcome(&user);
    Ok(())
}

/// Handle register command
pub async fn handle_register(
    email: Option<String>,
    name: Option<String>,
    password: Option<String>,
    config: &CliConfig,
) -> Result<()> {
    let email = prompt_email(email)?;
    let name = match name {
        Some(name) => name,
        None => Input::<String>::new().with_prompt("Name").interact_text()?,
    };
    let password = match password {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords do not match")
            .interact()?,
    };

    let client = config.build_client()?;
    let spinner = create_spinner("Creating account...");
    let user = match client.register(&email, &password, &name).await {
        Ok(user) => {
            complete_spinner_and_clear(spinner);
            user
        }
        Err(e) => {
            complete_spinner_error(spinner, "Registration failed");
            return Err(e.into());
        }
    };

    print_welcome(&user);
    Ok(())
}

fn print_welcome(user: &UserProfile) {
    print_success(&format!("Logged in as {} <{}>", user.name, user.email));
    print_info(&format!("Role: {}", user.role));
}

/// Handle logout command
pub fn handle_logout(config: &CliConfig) -> Result<()> {
    let client = config.build_client()?;
    if !client.is_authenticated() {
        print_info("Not logged in");
        return Ok(());
    }

    client.logout();
    print_success("Logged out");
    Ok(())
}

/// Handle status command
///
/// Reads the stored session only; nothing is sent to the portal.
pub fn handle_status(config: &CliConfig, json: bool) -> Result<()> {
    let client = config.build_client()?;
    let authenticated = client.is_authenticated();
    let expires_at = client.access_token_expires_at();
    let expired = authenticated && client.is_access_token_expired();

    if json {
        return json_output(&serde_json::json!({
            "base_url": client.base_url(),
            "authenticated": authenticated,
            "access_token_expires_at": expires_at,
            "access_token_expired": expired,
        }));
    }

    print_info(&format!("API: {}", client.base_url()));
    if !authenticated {
        print_info("Not logged in. Run 'abel login' to sign in.");
        return Ok(());
    }

    print_success("Logged in");
    match expires_at {
        Some(expires_at) if expired => print_info(&format!(
            "Access token expired at {}; it will be refreshed on the next request",
            expires_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
        )),
        Some(expires_at) => print_info(&format!(
            "Access token valid until {}",
            expires_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
        )),
        None => print_info("Access token expiry unknown"),
    }
    Ok(())
}
