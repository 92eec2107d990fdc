//! Authentication session: the single source of truth for "is someone logged in".
//!
//! A [`Session`] is a cloneable handle. Every clone observes the same token, so the
//! request pipeline, the guards and the login flow all receive the handle explicitly
//! instead of reaching for a global.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("authentication token must not be empty")]
    EmptyToken,
}

/// Opaque bearer token. Never empty.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(raw: impl Into<String>) -> Result<Self, SessionError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(SessionError::EmptyToken);
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    state: Arc<watch::Sender<Option<AuthToken>>>,
}

impl Session {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { state: Arc::new(tx) }
    }

    pub fn with_token(token: AuthToken) -> Self {
        let session = Self::new();
        session.set_token(token);
        session
    }

    pub fn token(&self) -> Option<AuthToken> {
        self.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// Replace the stored token, whatever was there before.
    pub fn set_token(&self, token: AuthToken) {
        self.state.send_replace(Some(token));
    }

    pub fn clear_token(&self) {
        self.state.send_replace(None);
    }

    /// Receiver that is marked changed on every `set_token` / `clear_token`.
    pub fn subscribe(&self) -> watch::Receiver<Option<AuthToken>> {
        self.state.subscribe()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
