//! Authentication helpers and token providers.
//! This module defines a minimal trait to supply Bearer tokens for Vertex AI.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::error::LlmError;

/// An asynchronous Bearer token provider.
///
/// Implementations may cache internally and refresh tokens when necessary.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns an access token string suitable for the `Authorization: Bearer <token>` header.
    async fn token(&self) -> Result<String, LlmError>;
}

/// A static token provider for tokens managed outside this crate.
pub struct StaticTokenProvider {
    token: SecretString,
}

impl StaticTokenProvider {
    /// Create a new static token provider.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
        }
    }
}

impl std::fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticTokenProvider([REDACTED])")
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn token(&self) -> Result<String, LlmError> {
        let token = self.token.expose_secret();
        if token.trim().is_empty() {
            return Err(LlmError::AuthenticationError(
                "static access token is empty".to_string(),
            ));
        }
        Ok(token.to_string())
    }
}

#[cfg(feature = "gcp")]
pub mod service_account;
pub mod vertex;
