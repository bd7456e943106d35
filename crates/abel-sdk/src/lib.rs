//! # Abel SDK
//!
//! Authenticated HTTP client for the Abel Labs client portal API.
//!
//! Every call made through [`AbelClient`] carries the current access token.
//! When the API rejects a token, the client refreshes it once for all callers
//! that hit the rejection concurrently, then replays each of them exactly once.
//! Callers never see the refresh or the replay.
//!
//! ```rust,no_run
//! use abel_sdk::ClientBuilder;
//!
//! # async fn example() -> abel_sdk::Result<()> {
//! let client = ClientBuilder::default()
//!     .base_url("http://localhost:3001")
//!     .with_file_storage()
//!     .build()?;
//!
//! client.login("client@example.com", "hunter2").await?;
//! let projects = client.list_projects().await?;
//! println!("{} projects", projects.len());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod pipeline;
pub mod transport;
pub mod types;

pub use auth::{
    Clock, CredentialPair, CredentialStore, FileStorage, KeyValueStorage, MemoryStorage,
    RefreshCoordinator, RefreshError, RefreshPhase, SystemClock, UserProfile,
};
pub use client::{AbelClient, ClientBuilder, DEFAULT_API_URL};
pub use error::{ApiError, ErrorResponse, Result};
pub use pipeline::{OutgoingRequest, RequestPipeline};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};
pub use types::{
    CheckoutSession, CreateCheckoutRequest, HealthStatus, Invoice, InvoiceItem, Payment,
    PaymentHistoryQuery, PaymentProvider, Project,
};
pub use reqwest::{Method, StatusCode};
