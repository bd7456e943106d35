//! Scripted in-process transport for unit tests

use super::{HttpRequest, HttpResponse, Transport, TransportError};
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Semaphore;

/// How the fake refresh endpoint answers
pub(crate) enum RefreshReply {
    Issue {
        access_token: String,
        refresh_token: Option<String>,
    },
    Status(StatusCode),
    Body(String),
    Fail(TransportError),
    Hang,
    Panic,
}

impl RefreshReply {
    pub(crate) fn issue(access_token: &str, refresh_token: Option<&str>) -> Self {
        RefreshReply::Issue {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.map(str::to_string),
        }
    }
}

/// Business endpoints accept exactly one bearer token; the refresh endpoint
/// answers with a scripted reply, optionally held until released.
pub(crate) struct FakeTransport {
    refresh_url: String,
    accepted_token: String,
    reply: RefreshReply,
    gate: Option<Semaphore>,
    refresh_calls: AtomicUsize,
    business_calls: AtomicUsize,
    seen_tokens: Mutex<Vec<Option<String>>>,
}

impl FakeTransport {
    pub(crate) fn new(
        refresh_url: &str,
        accepted_token: &str,
        reply: RefreshReply,
        gated: bool,
    ) -> Self {
        Self {
            refresh_url: refresh_url.to_string(),
            accepted_token: accepted_token.to_string(),
            reply,
            gate: gated.then(|| Semaphore::new(0)),
            refresh_calls: AtomicUsize::new(0),
            business_calls: AtomicUsize::new(0),
            seen_tokens: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn release_refresh(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub(crate) fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn business_calls(&self) -> usize {
        self.business_calls.load(Ordering::SeqCst)
    }

    /// Bearer tokens carried by business calls, in arrival order
    pub(crate) fn seen_tokens(&self) -> Vec<Option<String>> {
        self.seen_tokens.lock().clone()
    }

    async fn refresh(&self) -> Result<HttpResponse, TransportError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }

        match &self.reply {
            RefreshReply::Issue {
                access_token,
                refresh_token,
            } => {
                let body = serde_json::json!({
                    "accessToken": access_token,
                    "refreshToken": refresh_token,
                });
                Ok(HttpResponse::new(StatusCode::OK, body.to_string()))
            }
            RefreshReply::Status(status) => Ok(HttpResponse::new(
                *status,
                r#"{"statusCode":401,"message":"Invalid refresh token"}"#,
            )),
            RefreshReply::Body(body) => Ok(HttpResponse::new(StatusCode::OK, body.clone())),
            RefreshReply::Fail(error) => Err(error.clone()),
            RefreshReply::Hang => std::future::pending().await,
            RefreshReply::Panic => panic!("refresh transport exploded"),
        }
    }

    fn business(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.business_calls.fetch_add(1, Ordering::SeqCst);
        let token = request.bearer_token().map(str::to_string);
        self.seen_tokens.lock().push(token.clone());

        if request.url.ends_with("/offline") {
            return Err(TransportError::Network("connection refused".to_string()));
        }
        if request.url.ends_with("/forbidden") {
            return Ok(HttpResponse::new(
                StatusCode::FORBIDDEN,
                r#"{"statusCode":403,"message":"Forbidden resource"}"#,
            ));
        }

        if token.as_deref() == Some(self.accepted_token.as_str()) {
            Ok(HttpResponse::new(StatusCode::OK, r#"{"ok":true}"#))
        } else {
            Ok(HttpResponse::new(
                StatusCode::UNAUTHORIZED,
                r#"{"statusCode":401,"message":"Unauthorized"}"#,
            ))
        }
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        if request.url == self.refresh_url {
            self.refresh().await
        } else {
            self.business(&request)
        }
    }
}
