//! Raw authenticated request handler

use crate::config::CliConfig;
use crate::error::{CliError, Result};
use crate::output::{json_output, print_error, print_success};
use abel_sdk::{HttpResponse, Method};
use tracing::debug;

/// Parse a method name such as `get` or `POST`
pub fn parse_method(method: &str) -> Result<Method> {
    Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| CliError::invalid_input(format!("Invalid HTTP method: {method}")))
}

/// Parse the `--data` argument as JSON
pub fn parse_body(data: Option<&str>) -> Result<Option<serde_json::Value>> {
    data.map(|data| {
        serde_json::from_str(data)
            .map_err(|e| CliError::invalid_input(format!("--data is not valid JSON: {e}")))
    })
    .transpose()
}

/// Handle request command
pub async fn handle_request(
    method: &str,
    path: &str,
    data: Option<&str>,
    config: &CliConfig,
    json: bool,
) -> Result<()> {
    let method = parse_method(method)?;
    let body = parse_body(data)?;

    let client = config.build_client()?;
    debug!(%method, path, "Sending request");
    let response = client.request(method, path, body.as_ref()).await?;

    if json {
        return json_output(&serde_json::json!({
            "status": response.status.as_u16(),
            "body": response_body(&response),
        }));
    }

    let status_line = format!("{}", response.status);
    if response.is_success() {
        print_success(&status_line);
    } else {
        print_error(&status_line);
    }

    match response.json::<serde_json::Value>() {
        Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Err(_) if response.body.is_empty() => {}
        Err(_) => println!("{}", response.text()),
    }
    Ok(())
}

/// JSON body when the response has one, text otherwise
fn response_body(response: &HttpResponse) -> serde_json::Value {
    response
        .json()
        .unwrap_or_else(|_| serde_json::Value::String(response.text()))
}
