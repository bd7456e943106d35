//! Request pipeline
//!
//! Attaches the stored access token to every outgoing request and interprets
//! the response. An authorization failure is handed to the
//! [`RefreshCoordinator`]; once it resolves, the request is replayed exactly
//! once with the new token. Everything else passes through untouched.

use crate::auth::{CredentialStore, RefreshCoordinator};
use crate::error::{ApiError, ErrorResponse, Result};
use crate::transport::{HttpRequest, HttpResponse, Transport};
use std::sync::Arc;
use tracing::debug;

/// A request on its way through the pipeline
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    pub request: HttpRequest,
    /// Set once the request has been handed to the coordinator
    pub already_retried: bool,
}

impl OutgoingRequest {
    pub fn new(request: HttpRequest) -> Self {
        Self {
            request,
            already_retried: false,
        }
    }
}

/// Sends requests with credentials and a coordinated single replay
pub struct RequestPipeline {
    transport: Arc<dyn Transport>,
    store: Arc<CredentialStore>,
    coordinator: RefreshCoordinator,
}

impl RequestPipeline {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<CredentialStore>,
        coordinator: RefreshCoordinator,
    ) -> Self {
        Self {
            transport,
            store,
            coordinator,
        }
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.coordinator
    }

    /// Send `request` and return the final response
    ///
    /// Non-401 responses, including error statuses, are returned as they are.
    pub async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut outgoing = OutgoingRequest::new(request);
        if let Some(token) = self.store.access_token() {
            outgoing.request.set_bearer(&token);
        }

        loop {
            let response = self.transport.send(outgoing.request.clone()).await?;
            if !response.is_unauthorized() {
                return Ok(response);
            }

            if outgoing.already_retried {
                debug!(url = %outgoing.request.url, "Replayed request rejected again");
                return Err(ApiError::Authentication {
                    message: rejection_message(&response),
                });
            }
            outgoing.already_retried = true;

            debug!(url = %outgoing.request.url, "Access token rejected, requesting refresh");
            let rejected = outgoing.request.bearer_token().map(str::to_string);
            let token = self
                .coordinator
                .refresh_after_rejection(rejected.as_deref())
                .await?;
            outgoing.request.set_bearer(&token);
        }
    }
}

impl std::fmt::Debug for RequestPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPipeline")
            .field("store", &self.store)
            .field("coordinator", &self.coordinator)
            .finish()
    }
}

fn rejection_message(response: &HttpResponse) -> String {
    response
        .json::<ErrorResponse>()
        .ok()
        .and_then(|body| body.describe())
        .unwrap_or_else(|| "Credential rejected".to_string())
}
