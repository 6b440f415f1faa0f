//! System token cache
//!
//! Server-to-server calls use a password-grant bearer token. The cache owns
//! the current token and refreshes it through a [`CredentialExchange`] once
//! the clock reaches its expiry. Expiry is the provider's TTL minus a safety
//! margin so a token is never presented in its final minute.
//!
//! Failures are returned as-is; the cache never retries. Callers treat a
//! missing token as fatal for the whole monitoring cycle.

use crate::error::{TelematicsError, TelematicsResult};
use chrono::{DateTime, Duration, Utc};
use fleetwatch_core::Clock;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Margin subtracted from the provider's reported TTL
pub const DEFAULT_SAFETY_MARGIN_SECS: i64 = 60;

/// TTL assumed when the provider does not report one
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// Longest lifetime honoured from a provider; larger values are capped
pub const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;

/// Raw result of a credential exchange
#[derive(Clone, PartialEq)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_in: Option<Duration>,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("access_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Cached bearer credential
#[derive(Clone, PartialEq)]
pub struct SystemToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl SystemToken {
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

impl fmt::Debug for SystemToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Exchanges configured service credentials for a fresh token.
pub trait CredentialExchange: Send + Sync {
    fn exchange(&self) -> impl Future<Output = TelematicsResult<IssuedToken>> + Send;
}

pub struct TokenCache<E> {
    exchange: E,
    clock: Arc<dyn Clock>,
    safety_margin: Duration,
    cached: Mutex<Option<SystemToken>>,
}

impl<E: CredentialExchange> TokenCache<E> {
    pub fn new(exchange: E, clock: Arc<dyn Clock>) -> Self {
        Self::with_safety_margin(exchange, clock, Duration::seconds(DEFAULT_SAFETY_MARGIN_SECS))
    }

    pub fn with_safety_margin(exchange: E, clock: Arc<dyn Clock>, safety_margin: Duration) -> Self {
        Self {
            exchange,
            clock,
            safety_margin,
            cached: Mutex::new(None),
        }
    }

    /// Cached token if still valid, otherwise a freshly exchanged one.
    pub async fn get_token(&self) -> TelematicsResult<SystemToken> {
        let mut slot = self.cached.lock().await;
        let now = self.clock.now();

        if let Some(token) = slot.as_ref() {
            if token.is_valid_at(now) {
                debug!(expires_at = %token.expires_at, "Using cached system token");
                return Ok(token.clone());
            }
        }

        let issued = self.exchange.exchange().await?;
        let ttl = issued
            .expires_in
            .unwrap_or_else(|| Duration::seconds(DEFAULT_TOKEN_TTL_SECS))
            .min(Duration::seconds(MAX_TOKEN_TTL_SECS));
        // A TTL inside the margin yields a token already expired for the next caller.
        let expires_at = now
            .checked_add_signed(ttl)
            .and_then(|t| t.checked_sub_signed(self.safety_margin))
            .ok_or_else(|| TelematicsError::Payload {
                endpoint: "token".to_string(),
                message: format!("token lifetime of {}s is out of range", ttl.num_seconds()),
            })?;
        let token = SystemToken::new(issued.access_token, expires_at);

        info!(expires_at = %expires_at, ttl_secs = ttl.num_seconds(), "System token refreshed");

        *slot = Some(token.clone());
        Ok(token)
    }

    /// Forget the cached token so the next call exchanges again.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    pub fn exchange(&self) -> &E {
        &self.exchange
    }
}
