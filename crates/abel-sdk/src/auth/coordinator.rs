//! Single-flight token refresh
//!
//! When the API rejects an access token, every request that observes the
//! rejection asks the [`RefreshCoordinator`] for a new one. The first caller
//! starts the one and only refresh exchange; callers arriving while it is in
//! flight are queued and settled with the same outcome once it completes.
//!
//! On success the new pair is stored before any queued caller is woken, so
//! nobody can observe the stale token after the exchange. On failure the
//! stored pair is cleared and every caller receives the refresh failure.

use super::store::CredentialStore;
use super::types::{CredentialPair, RefreshRequest, RefreshResponse};
use crate::transport::{HttpRequest, Transport, TransportError};
use parking_lot::Mutex;
use reqwest::Method;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Why a refresh exchange did not produce a new access token
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    /// Nothing to exchange
    #[error("no refresh token available")]
    MissingRefreshToken,

    /// Refresh endpoint answered with a non-success status
    #[error("refresh token rejected with status {status}")]
    Rejected { status: u16 },

    /// Refresh request got no response
    #[error("refresh request failed: {0}")]
    Network(String),

    /// Refresh request exceeded the refresh timeout
    #[error("refresh request timed out")]
    TimedOut,

    /// Refresh request could not be encoded
    #[error("failed to encode refresh request: {0}")]
    Encode(String),

    /// Success status with an unusable body
    #[error("invalid refresh response: {0}")]
    InvalidResponse(String),

    /// The exchange task stopped before producing an outcome
    #[error("refresh abandoned before completion")]
    Abandoned,
}

/// New access token, or the failure shared by all callers of one exchange
pub type RefreshOutcome = Result<String, RefreshError>;

/// Observable state of the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    Idle,
    Refreshing,
}

/// A caller suspended until the in-flight exchange completes
struct PendingRequest {
    sender: oneshot::Sender<RefreshOutcome>,
}

impl PendingRequest {
    /// Consumes the request, so it can be settled only once
    fn settle(self, outcome: RefreshOutcome) {
        // Receiver dropped: the caller stopped waiting
        let _ = self.sender.send(outcome);
    }
}

enum RefreshState {
    Idle,
    Refreshing { waiters: Vec<PendingRequest> },
}

/// What a caller does after inspecting the state
enum Role {
    /// Starts the exchange and awaits it directly
    Owner,
    /// Joins the queue of the running exchange
    Waiter(oneshot::Receiver<RefreshOutcome>),
    /// Token was already replaced since the caller's request was sent
    Current(String),
}

struct Inner {
    store: Arc<CredentialStore>,
    transport: Arc<dyn Transport>,
    refresh_url: String,
    timeout: Duration,
    state: Mutex<RefreshState>,
    exchanges: AtomicU64,
}

/// Ensures at most one refresh exchange is in flight
///
/// Cloning is cheap; clones share the same state.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

impl RefreshCoordinator {
    /// Default bound on one refresh exchange
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

    pub fn new(
        store: Arc<CredentialStore>,
        transport: Arc<dyn Transport>,
        refresh_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                transport,
                refresh_url: refresh_url.into(),
                timeout,
                state: Mutex::new(RefreshState::Idle),
                exchanges: AtomicU64::new(0),
            }),
        }
    }

    pub fn phase(&self) -> RefreshPhase {
        match *self.inner.state.lock() {
            RefreshState::Idle => RefreshPhase::Idle,
            RefreshState::Refreshing { .. } => RefreshPhase::Refreshing,
        }
    }

    /// Callers queued behind the in-flight exchange
    pub fn pending(&self) -> usize {
        match &*self.inner.state.lock() {
            RefreshState::Idle => 0,
            RefreshState::Refreshing { waiters } => waiters.len(),
        }
    }

    /// Refresh requests sent to the transport so far
    pub fn exchanges(&self) -> u64 {
        self.inner.exchanges.load(Ordering::SeqCst)
    }

    /// Obtain a replacement for `rejected_token`, which the server refused
    ///
    /// `rejected_token` is the access token the failed request carried, or
    /// `None` if it was sent unauthenticated.
    pub async fn refresh_after_rejection(&self, rejected_token: Option<&str>) -> RefreshOutcome {
        let role = {
            let mut state = self.inner.state.lock();
            match &mut *state {
                RefreshState::Refreshing { waiters } => {
                    let (sender, receiver) = oneshot::channel();
                    waiters.push(PendingRequest { sender });
                    Role::Waiter(receiver)
                }
                RefreshState::Idle => match self.inner.store.access_token() {
                    Some(current) if rejected_token != Some(current.as_str()) => {
                        Role::Current(current)
                    }
                    _ => {
                        *state = RefreshState::Refreshing {
                            waiters: Vec::new(),
                        };
                        Role::Owner
                    }
                },
            }
        };

        match role {
            Role::Current(token) => {
                debug!("Rejected token was already replaced, reusing current token");
                Ok(token)
            }
            Role::Waiter(receiver) => {
                debug!("Refresh in flight, waiting for its outcome");
                receiver.await.unwrap_or(Err(RefreshError::Abandoned))
            }
            Role::Owner => {
                // The exchange outlives a caller that stops waiting for it
                let inner = Arc::clone(&self.inner);
                let exchange = tokio::spawn(async move { inner.run_exchange().await });
                exchange.await.unwrap_or(Err(RefreshError::Abandoned))
            }
        }
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("refresh_url", &self.inner.refresh_url)
            .field("phase", &self.phase())
            .field("pending", &self.pending())
            .finish()
    }
}

/// Settles the queue as abandoned if the exchange never reaches its outcome
struct SettleOnDrop<'a> {
    inner: &'a Inner,
    settled: bool,
}

impl Drop for SettleOnDrop<'_> {
    fn drop(&mut self) {
        if !self.settled {
            // The owner is gone, only the queue needs the outcome
            let _ = self.inner.settle(Err(RefreshError::Abandoned));
        }
    }
}

impl Inner {
    async fn run_exchange(&self) -> RefreshOutcome {
        let mut guard = SettleOnDrop {
            inner: self,
            settled: false,
        };
        let result = self.exchange().await;
        guard.settled = true;
        self.settle(result)
    }

    async fn exchange(&self) -> Result<CredentialPair, RefreshError> {
        let refresh_token = self
            .store
            .get()
            .map(|pair| pair.refresh_token)
            .filter(|token| !token.is_empty())
            .ok_or(RefreshError::MissingRefreshToken)?;

        let request = HttpRequest::new(Method::POST, &self.refresh_url)
            .json(&RefreshRequest {
                refresh_token: &refresh_token,
            })
            .map_err(|e| RefreshError::Encode(e.to_string()))?;

        debug!("Starting token refresh exchange");
        self.exchanges.fetch_add(1, Ordering::SeqCst);

        let response = match tokio::time::timeout(self.timeout, self.transport.send(request)).await
        {
            Err(_) | Ok(Err(TransportError::Timeout)) => return Err(RefreshError::TimedOut),
            Ok(Err(TransportError::Network(message))) => {
                return Err(RefreshError::Network(message))
            }
            Ok(Ok(response)) => response,
        };

        if !response.is_success() {
            return Err(RefreshError::Rejected {
                status: response.status.as_u16(),
            });
        }

        let body: RefreshResponse = response
            .json()
            .map_err(|e| RefreshError::InvalidResponse(e.to_string()))?;
        if body.access_token.is_empty() {
            return Err(RefreshError::InvalidResponse(
                "empty access token".to_string(),
            ));
        }

        Ok(body.into_pair(&refresh_token))
    }

    /// Store the result, then drain the queue in arrival order
    ///
    /// Runs under the state lock without suspending, so the store is updated
    /// before any waiter can resume. A file-backed store writes synchronously
    /// here; an async write would open a window where a waiter sees the old
    /// pair.
    fn settle(&self, result: Result<CredentialPair, RefreshError>) -> RefreshOutcome {
        let mut state = self.state.lock();
        let waiters = match std::mem::replace(&mut *state, RefreshState::Idle) {
            RefreshState::Refreshing { waiters } => waiters,
            RefreshState::Idle => Vec::new(),
        };

        let outcome = match result {
            Ok(pair) => {
                let access_token = pair.access_token.clone();
                self.store.set(pair);
                info!(waiters = waiters.len(), "Token refresh completed successfully");
                Ok(access_token)
            }
            Err(e) => {
                self.store.clear();
                warn!(
                    waiters = waiters.len(),
                    "Token refresh failed, credentials cleared: {}", e
                );
                Err(e)
            }
        };

        for waiter in waiters {
            waiter.settle(outcome.clone());
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::fake::{FakeTransport, RefreshReply};
    use pretty_assertions::assert_eq;

    const REFRESH_URL: &str = "http://portal.test/auth/refresh";

    fn setup(
        reply: RefreshReply,
        gated: bool,
    ) -> (Arc<CredentialStore>, Arc<FakeTransport>, RefreshCoordinator) {
        let store = Arc::new(CredentialStore::in_memory());
        store.set(CredentialPair::new("stale", "r1"));
        let transport = Arc::new(FakeTransport::new(REFRESH_URL, "fresh", reply, gated));
        let coordinator = RefreshCoordinator::new(
            store.clone(),
            transport.clone(),
            REFRESH_URL,
            Duration::from_secs(5),
        );
        (store, transport, coordinator)
    }

    async fn wait_until(condition: impl Fn() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !condition() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("condition not reached");
    }

    fn spawn_rejection(
        coordinator: &RefreshCoordinator,
        token: &'static str,
    ) -> tokio::task::JoinHandle<RefreshOutcome> {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.refresh_after_rejection(Some(token)).await })
    }

    #[tokio::test]
    async fn test_concurrent_rejections_share_one_exchange() {
        let (store, transport, coordinator) = setup(RefreshReply::issue("fresh", None), true);

        let handles: Vec<_> = (0..5)
            .map(|_| spawn_rejection(&coordinator, "stale"))
            .collect();

        wait_until(|| coordinator.pending() == 4).await;
        assert_eq!(coordinator.phase(), RefreshPhase::Refreshing);
        assert_eq!(transport.refresh_calls(), 1);

        transport.release_refresh();
        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok("fresh".to_string()));
        }

        assert_eq!(transport.refresh_calls(), 1);
        assert_eq!(coordinator.exchanges(), 1);
        assert_eq!(coordinator.phase(), RefreshPhase::Idle);
        assert_eq!(coordinator.pending(), 0);
        assert_eq!(store.get(), Some(CredentialPair::new("fresh", "r1")));
    }

    #[tokio::test]
    async fn test_rotated_refresh_token_is_stored() {
        let (store, _transport, coordinator) =
            setup(RefreshReply::issue("fresh", Some("r2")), false);

        let outcome = coordinator.refresh_after_rejection(Some("stale")).await;

        assert_eq!(outcome, Ok("fresh".to_string()));
        assert_eq!(store.get(), Some(CredentialPair::new("fresh", "r2")));
    }

    #[tokio::test]
    async fn test_failed_exchange_rejects_everyone_and_clears_store() {
        let (store, transport, coordinator) =
            setup(RefreshReply::Status(reqwest::StatusCode::UNAUTHORIZED), true);

        let handles: Vec<_> = (0..3)
            .map(|_| spawn_rejection(&coordinator, "stale"))
            .collect();
        wait_until(|| coordinator.pending() == 2).await;
        transport.release_refresh();

        for handle in handles {
            assert_eq!(
                handle.await.unwrap(),
                Err(RefreshError::Rejected { status: 401 })
            );
        }
        assert!(store.get().is_none());
        assert_eq!(coordinator.phase(), RefreshPhase::Idle);

        // Not stuck: the next rejection is handled immediately
        let next = coordinator.refresh_after_rejection(Some("stale")).await;
        assert_eq!(next, Err(RefreshError::MissingRefreshToken));
        assert_eq!(transport.refresh_calls(), 1);
        assert_eq!(coordinator.phase(), RefreshPhase::Idle);
    }

    #[tokio::test]
    async fn test_network_failure_is_reported_as_such() {
        let (store, _transport, coordinator) = setup(
            RefreshReply::Fail(TransportError::Network("connection refused".into())),
            false,
        );

        let outcome = coordinator.refresh_after_rejection(Some("stale")).await;

        assert_eq!(
            outcome,
            Err(RefreshError::Network("connection refused".to_string()))
        );
        assert!(store.get().is_none());
    }

    #[tokio::test]
    async fn test_malformed_refresh_body() {
        let (store, _transport, coordinator) = setup(RefreshReply::Body("{}".into()), false);

        let outcome = coordinator.refresh_after_rejection(Some("stale")).await;

        assert!(matches!(outcome, Err(RefreshError::InvalidResponse(_))));
        assert!(store.get().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_exchange_times_out() {
        let (store, transport, coordinator) = setup(RefreshReply::Hang, false);

        let owner = spawn_rejection(&coordinator, "stale");
        wait_until(|| coordinator.phase() == RefreshPhase::Refreshing).await;
        let waiter = spawn_rejection(&coordinator, "stale");
        wait_until(|| coordinator.pending() == 1).await;

        assert_eq!(owner.await.unwrap(), Err(RefreshError::TimedOut));
        assert_eq!(waiter.await.unwrap(), Err(RefreshError::TimedOut));
        assert_eq!(transport.refresh_calls(), 1);
        assert_eq!(coordinator.phase(), RefreshPhase::Idle);
        assert!(store.get().is_none());
    }

    #[tokio::test]
    async fn test_stale_rejection_reuses_current_token() {
        let (store, transport, coordinator) = setup(RefreshReply::issue("never", None), false);
        store.set(CredentialPair::new("fresh", "r2"));

        let outcome = coordinator.refresh_after_rejection(Some("stale")).await;

        assert_eq!(outcome, Ok("fresh".to_string()));
        assert_eq!(transport.refresh_calls(), 0);
        assert_eq!(coordinator.exchanges(), 0);
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_without_network() {
        let (store, transport, coordinator) = setup(RefreshReply::issue("fresh", None), false);
        store.clear();

        let outcome = coordinator.refresh_after_rejection(None).await;

        assert_eq!(outcome, Err(RefreshError::MissingRefreshToken));
        assert_eq!(transport.refresh_calls(), 0);
        assert_eq!(coordinator.phase(), RefreshPhase::Idle);
    }

    #[tokio::test]
    async fn test_dropped_owner_does_not_strand_waiters() {
        let (store, transport, coordinator) = setup(RefreshReply::issue("fresh", None), true);

        let owner = spawn_rejection(&coordinator, "stale");
        wait_until(|| transport.refresh_calls() == 1).await;
        owner.abort();
        assert!(owner.await.unwrap_err().is_cancelled());

        let waiter = spawn_rejection(&coordinator, "stale");
        wait_until(|| coordinator.pending() == 1).await;
        transport.release_refresh();

        assert_eq!(waiter.await.unwrap(), Ok("fresh".to_string()));
        assert_eq!(store.access_token().as_deref(), Some("fresh"));
        assert_eq!(coordinator.phase(), RefreshPhase::Idle);
    }

    #[tokio::test]
    async fn test_panicking_transport_settles_queue() {
        let (store, transport, coordinator) = setup(RefreshReply::Panic, true);

        let owner = spawn_rejection(&coordinator, "stale");
        wait_until(|| transport.refresh_calls() == 1).await;
        let waiter = spawn_rejection(&coordinator, "stale");
        wait_until(|| coordinator.pending() == 1).await;
        transport.release_refresh();

        assert_eq!(owner.await.unwrap(), Err(RefreshError::Abandoned));
        assert_eq!(waiter.await.unwrap(), Err(RefreshError::Abandoned));
        assert_eq!(coordinator.phase(), RefreshPhase::Idle);
        assert!(store.get().is_none());
    }

    #[tokio::test]
    async fn test_file_is_written_before_waiters_resume() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let store = Arc::new(CredentialStore::open(
            crate::auth::FileStorage::open(&path).unwrap(),
        ));
        store.set(CredentialPair::new("stale", "r1"));
        let transport = Arc::new(FakeTransport::new(
            REFRESH_URL,
            "fresh",
            RefreshReply::issue("fresh", Some("r2")),
            true,
        ));
        let coordinator = RefreshCoordinator::new(
            store.clone(),
            transport.clone(),
            REFRESH_URL,
            Duration::from_secs(5),
        );

        let owner = spawn_rejection(&coordinator, "stale");
        wait_until(|| transport.refresh_calls() == 1).await;
        let waiter = {
            let coordinator = coordinator.clone();
            let path = path.clone();
            tokio::spawn(async move {
                let outcome = coordinator.refresh_after_rejection(Some("stale")).await;
                let on_disk: serde_json::Value =
                    serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
                (outcome, on_disk)
            })
        };
        wait_until(|| coordinator.pending() == 1).await;
        transport.release_refresh();

        let (outcome, on_disk) = waiter.await.unwrap();
        assert_eq!(outcome, Ok("fresh".to_string()));
        assert_eq!(
            on_disk,
            serde_json::json!({ "accessToken": "fresh", "refreshToken": "r2" })
        );
        assert_eq!(owner.await.unwrap(), Ok("fresh".to_string()));
    }
}
