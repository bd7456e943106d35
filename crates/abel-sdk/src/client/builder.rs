//! Builder for [`AbelClient`]

use super::AbelClient;
use crate::auth::{
    Clock, CredentialPair, CredentialStore, FileStorage, KeyValueStorage, RefreshCoordinator,
    SystemClock,
};
use crate::error::{ApiError, Result};
use crate::transport::{ReqwestTransport, Transport, DEFAULT_TIMEOUT_SECS};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Default API URL when not specified
pub const DEFAULT_API_URL: &str = "http://localhost:3001";

/// Where the client keeps its credentials
#[derive(Default)]
enum StorageChoice {
    #[default]
    Memory,
    File(Option<PathBuf>),
    Backend(Box<dyn KeyValueStorage>),
    Store(Arc<CredentialStore>),
}

/// Builder for constructing an [`AbelClient`] with custom configuration
#[derive(Default)]
pub struct ClientBuilder {
    base_url: Option<String>,
    tokens: Option<CredentialPair>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    pool_max_idle_per_host: Option<usize>,
    refresh_timeout: Option<Duration>,
    storage: StorageChoice,
    transport: Option<Arc<dyn Transport>>,
    clock: Option<Arc<dyn Clock>>,
}

impl ClientBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL for the API
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Seed the store with an existing pair, replacing anything it holds
    pub fn with_tokens(
        mut self,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        self.tokens = Some(CredentialPair::new(access_token, refresh_token));
        self
    }

    /// Keep credentials in memory only (default)
    pub fn with_memory_storage(mut self) -> Self {
        self.storage = StorageChoice::Memory;
        self
    }

    /// Persist credentials in the platform data directory
    pub fn with_file_storage(mut self) -> Self {
        self.storage = StorageChoice::File(None);
        self
    }

    /// Persist credentials in the given JSON file
    pub fn with_credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage = StorageChoice::File(Some(path.into()));
        self
    }

    /// Persist credentials through a custom backend
    pub fn with_storage(mut self, backend: impl KeyValueStorage + 'static) -> Self {
        self.storage = StorageChoice::Backend(Box::new(backend));
        self
    }

    /// Share an existing store
    pub fn with_store(mut self, store: Arc<CredentialStore>) -> Self {
        self.storage = StorageChoice::Store(store);
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the maximum idle connections per host
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = Some(max);
        self
    }

    /// Bound on one refresh exchange
    pub fn refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = Some(timeout);
        self
    }

    /// Use a custom transport; the HTTP knobs above are then ignored
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Build the client
    pub fn build(self) -> Result<AbelClient> {
        let base_url = normalize_base_url(self.base_url.as_deref().unwrap_or(DEFAULT_API_URL))?;

        let store = match self.storage {
            StorageChoice::Memory => Arc::new(CredentialStore::in_memory()),
            StorageChoice::File(path) => {
                let path = match path {
                    Some(path) => path,
                    None => FileStorage::default_path().map_err(|e| {
                        ApiError::Storage(format!("Failed to resolve data directory: {e}"))
                    })?,
                };
                let storage = FileStorage::open(&path).map_err(|e| {
                    ApiError::Storage(format!("Failed to open {}: {e}", path.display()))
                })?;
                Arc::new(CredentialStore::open(storage))
            }
            StorageChoice::Backend(backend) => Arc::new(CredentialStore::open(backend)),
            StorageChoice::Store(store) => store,
        };
        if let Some(tokens) = self.tokens {
            store.set(tokens);
        }

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => {
                let timeout = self
                    .timeout
                    .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
                let mut builder = reqwest::Client::builder().timeout(timeout);
                if let Some(connect_timeout) = self.connect_timeout {
                    builder = builder.connect_timeout(connect_timeout);
                }
                if let Some(max) = self.pool_max_idle_per_host {
                    builder = builder.pool_max_idle_per_host(max);
                }
                let client = builder.build().map_err(|e| ApiError::Internal {
                    message: format!("Failed to create HTTP client: {e}"),
                })?;
                Arc::new(ReqwestTransport::from_client(client))
            }
        };

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let refresh_timeout = self
            .refresh_timeout
            .unwrap_or(RefreshCoordinator::DEFAULT_TIMEOUT);

        Ok(AbelClient::new(
            base_url,
            transport,
            store,
            refresh_timeout,
            clock,
        ))
    }
}

/// Validate the base URL and strip trailing slashes
fn normalize_base_url(raw: &str) -> Result<String> {
    let url = Url::parse(raw).map_err(|e| ApiError::InvalidRequest {
        message: format!("Invalid base URL '{raw}': {e}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::InvalidRequest {
            message: format!("Unsupported base URL scheme: {}", url.scheme()),
        });
    }
    Ok(raw.trim_end_matches('/').to_string())
}
