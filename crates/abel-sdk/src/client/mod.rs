//! HTTP client for the Abel Labs portal API
//!
//! [`AbelClient`] sends every business call through the
//! [`RequestPipeline`], so an expired access token is refreshed and the call
//! replayed without the caller noticing. Login and registration go straight
//! to the transport: they are how credentials are obtained in the first place.
//!
//! # Usage
//!
//! ```rust,no_run
//! use abel_sdk::ClientBuilder;
//! use reqwest::Method;
//!
//! # async fn example() -> abel_sdk::Result<()> {
//! let client = ClientBuilder::default()
//!     .base_url("http://localhost:3001")
//!     .with_tokens("access_token", "refresh_token")
//!     .build()?;
//!
//! let response = client.request(Method::GET, "/projects", None).await?;
//! println!("{}", response.status);
//! # Ok(())
//! # }
//! ```

mod builder;

pub use builder::{ClientBuilder, DEFAULT_API_URL};

use crate::auth::{
    is_token_expired, token_expiration, AuthResponse, Clock, CredentialPair, CredentialStore,
    LoginCredentials, RefreshCoordinator, RefreshPhase, RegisterCredentials, UserProfile,
};
use crate::error::{ApiError, ErrorResponse, Result};
use crate::pipeline::RequestPipeline;
use crate::transport::{HttpRequest, HttpResponse, Transport};
use crate::types::{
    CheckoutSession, CreateCheckoutRequest, HealthStatus, Invoice, Payment, PaymentHistoryQuery,
    Project,
};
use chrono::{DateTime, Utc};
use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// HTTP client for the portal API
pub struct AbelClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    store: Arc<CredentialStore>,
    pipeline: RequestPipeline,
    clock: Arc<dyn Clock>,
}

impl AbelClient {
    /// Create a new client (private - use ClientBuilder instead)
    fn new(
        base_url: String,
        transport: Arc<dyn Transport>,
        store: Arc<CredentialStore>,
        refresh_timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let coordinator = RefreshCoordinator::new(
            store.clone(),
            transport.clone(),
            format!("{base_url}/auth/refresh"),
            refresh_timeout,
        );
        let pipeline = RequestPipeline::new(transport.clone(), store.clone(), coordinator);

        Self {
            base_url,
            transport,
            store,
            pipeline,
            clock,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send an authenticated request to `path`
    ///
    /// The response is returned whatever its status, except that a credential
    /// rejection which survives the refresh is reported as an error.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<HttpResponse> {
        self.send(method, path, body).await
    }

    // ===== Authentication =====

    /// Log in and store the issued credentials
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile> {
        let credentials = LoginCredentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.authenticate("/auth/login", &credentials).await
    }

    /// Create an account and store the issued credentials
    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<UserProfile> {
        let credentials = RegisterCredentials {
            email: email.to_string(),
            password: password.to_string(),
            name: name.to_string(),
        };
        self.authenticate("/auth/register", &credentials).await
    }

    /// Forget the stored credentials
    pub fn logout(&self) {
        self.store.clear();
        info!("Logged out");
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    pub fn credentials(&self) -> Option<CredentialPair> {
        self.store.get()
    }

    /// Expiry embedded in the stored access token, if it can be decoded
    pub fn access_token_expires_at(&self) -> Option<DateTime<Utc>> {
        token_expiration(&self.store.access_token()?)
    }

    /// Whether the stored access token is missing or past its expiry
    ///
    /// Informational only; requests are sent regardless and refreshed on
    /// rejection.
    pub fn is_access_token_expired(&self) -> bool {
        match self.store.access_token() {
            Some(token) => is_token_expired(&token, self.clock.as_ref()),
            None => true,
        }
    }

    pub fn refresh_phase(&self) -> RefreshPhase {
        self.pipeline.coordinator().phase()
    }

    pub fn coordinator(&self) -> &RefreshCoordinator {
        self.pipeline.coordinator()
    }

    // ===== Health =====

    pub async fn health_check(&self) -> Result<HealthStatus> {
        self.get("/health").await
    }

    // ===== Projects =====

    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        self.get("/projects").await
    }

    pub async fn get_project(&self, project_id: &str) -> Result<Project> {
        self.get(&format!("/projects/{project_id}")).await
    }

    // ===== Invoices =====

    pub async fn list_invoices(&self) -> Result<Vec<Invoice>> {
        self.get("/invoices").await
    }

    pub async fn get_invoice(&self, invoice_id: &str) -> Result<Invoice> {
        self.get(&format!("/invoices/{invoice_id}")).await
    }

    // ===== Payments =====

    /// Payments visible to the current user
    pub async fn payment_history(&self, query: &PaymentHistoryQuery) -> Result<Vec<Payment>> {
        let query = query.to_query_string();
        let path = if query.is_empty() {
            "/payments/history".to_string()
        } else {
            format!("/payments/history?{query}")
        };
        self.get(&path).await
    }

    /// Create a hosted checkout session for an invoice
    pub async fn create_checkout(&self, request: &CreateCheckoutRequest) -> Result<CheckoutSession> {
        self.post("/payments/checkout", request).await
    }

    // ===== Private Helper Methods =====

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn build_request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<HttpRequest> {
        let request = HttpRequest::new(method, self.url(path));
        match body {
            Some(body) => Ok(request.json(body)?),
            None => Ok(request),
        }
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<HttpResponse> {
        let request = self.build_request(method, path, body)?;
        self.pipeline.execute(request).await
    }

    /// Generic GET request
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send::<()>(Method::GET, path, None).await?;
        self.handle_response(response)
    }

    /// Generic POST request
    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self.send(Method::POST, path, Some(body)).await?;
        self.handle_response(response)
    }

    /// Exchange credentials for a token pair, outside the pipeline
    async fn authenticate<B: Serialize>(&self, path: &str, body: &B) -> Result<UserProfile> {
        let request = self.build_request(Method::POST, path, Some(body))?;
        let response = self.transport.send(request).await?;
        let auth: AuthResponse = self.handle_response(response)?;

        self.store.set(auth.credentials());
        debug!(user_id = %auth.user.id, "Stored credentials");
        Ok(auth.user)
    }

    /// Handle successful response
    fn handle_response<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T> {
        if response.is_success() {
            Ok(response.json()?)
        } else {
            self.handle_error_response(response)
        }
    }

    /// Handle error response
    fn handle_error_response<T>(&self, response: HttpResponse) -> Result<T> {
        let status = response.status;
        let message = response
            .json::<ErrorResponse>()
            .ok()
            .and_then(|body| body.describe());

        match status {
            StatusCode::UNAUTHORIZED => Err(ApiError::Authentication {
                message: message.unwrap_or_else(|| "Authentication failed".into()),
            }),
            StatusCode::FORBIDDEN => Err(ApiError::Authorization {
                message: message.unwrap_or_else(|| "Access forbidden".into()),
            }),
            StatusCode::TOO_MANY_REQUESTS => Err(ApiError::RateLimitExceeded),
            StatusCode::NOT_FOUND => Err(ApiError::NotFound {
                resource: message.unwrap_or_else(|| "Resource not found".into()),
            }),
            StatusCode::BAD_REQUEST => Err(ApiError::BadRequest {
                message: message.unwrap_or_else(|| response.text()),
            }),
            _ => Err(ApiError::Internal {
                message: match message {
                    Some(message) => message,
                    None => format!("Request failed with status {status}: {}", response.text()),
                },
            }),
        }
    }
}

impl std::fmt::Debug for AbelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbelClient")
            .field("base_url", &self.base_url)
            .field("store", &self.store)
            .field("pipeline", &self.pipeline)
            .finish()
    }
}
