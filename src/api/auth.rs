//! Bearer credentials handed explicitly to the HTTP client.
//!
//! The client never reaches for a global session. Whoever builds a
//! [`HiringClient`](super::HiringClient) decides where tokens come from and how
//! they are renewed.

use std::sync::RwLock;

use super::error::ApiError;

/// Supplies bearer tokens and renews them when the server rejects one.
pub trait CredentialProvider {
    /// Current token for the `Authorization` header.
    async fn bearer_token(&self) -> Result<String, ApiError>;

    /// Called once after a 401; returns the token to retry with.
    async fn refresh(&self) -> Result<String, ApiError>;

    /// Forget the session (logout). Later requests fail until a new token is set.
    fn clear(&self);
}

/// A fixed token, typically from configuration or the environment.
#[derive(Debug)]
pub struct StaticToken {
    token: RwLock<Option<String>>,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            token: RwLock::new((!token.is_empty()).then_some(token)),
        }
    }

    /// Replace the token (login).
    pub fn set(&self, token: impl Into<String>) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(token.into());
    }

    fn current(&self) -> Result<String, ApiError> {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or_else(|| ApiError::Credentials("no bearer token configured".into()))
    }
}

impl CredentialProvider for StaticToken {
    async fn bearer_token(&self) -> Result<String, ApiError> {
        self.current()
    }

    async fn refresh(&self) -> Result<String, ApiError> {
        // Nothing to renew against; the retry goes out with the same token.
        self.current()
    }

    fn clear(&self) {
        let mut guard = self.token.write().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }
}
