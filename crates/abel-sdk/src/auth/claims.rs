//! Read-only inspection of access token expiry
//!
//! Decodes the `exp` claim of a JWT payload without verifying the signature.
//! The result only feeds proactive decisions such as status displays; the
//! server's rejection stays the sole authority on whether a token is valid.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, TimeZone, Utc};

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Extract the `exp` claim (seconds since epoch) from a JWT
fn decode_exp(token: &str) -> Option<i64> {
    let mut parts = token.split('.');
    let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    // Tolerate padded encoders
    let decoded = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&decoded).ok()?;
    let exp = claims.get("exp")?;
    exp.as_i64().or_else(|| exp.as_f64().map(|secs| secs as i64))
}

/// Expiry instant embedded in the token, if it can be decoded
pub fn token_expiration(token: &str) -> Option<DateTime<Utc>> {
    let exp = decode_exp(token)?;
    Utc.timestamp_opt(exp, 0).single()
}

/// Whether the token is past its embedded expiry
///
/// Tokens that cannot be decoded count as expired.
pub fn is_token_expired(token: &str, clock: &dyn Clock) -> bool {
    match token_expiration(token) {
        Some(expires_at) => clock.now() >= expires_at,
        None => true,
    }
}
