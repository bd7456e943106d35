//! Authentication module for the Abel SDK
//!
//! Credential storage, token expiry inspection and the single-flight refresh
//! coordinator shared by every request of a client.

pub mod claims;
pub mod coordinator;
pub mod store;
pub mod types;

pub use claims::{is_token_expired, token_expiration, Clock, SystemClock};
pub use coordinator::{RefreshCoordinator, RefreshError, RefreshOutcome, RefreshPhase};
pub use store::{
    CredentialStore, FileStorage, KeyValueStorage, MemoryStorage, ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
};
pub use types::{AuthResponse, CredentialPair, LoginCredentials, RegisterCredentials, UserProfile};
