//! Core error types.

use thiserror::Error;

use crate::cache::ToolCacheConflict;

/// Coarse error classification used for presentation and retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Authentication,
    RateLimit,
    Client,
    Server,
    Network,
    Parsing,
    Validation,
    Configuration,
    Unsupported,
    /// A combination of settings the vendor API rejects (e.g. tools + cached content).
    Conflict,
    Unknown,
}

/// Errors produced by this crate.
///
/// Vendor failures from the generation call are carried as `ApiError`/`HttpError`
/// exactly as received; nothing in this crate retries or rewrites them.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Missing or incompatible configuration, raised as early as possible.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("JSON error: {0}")]
    JsonError(String),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// Non-success response from the vendor API.
    #[error("API error {code}: {message}")]
    ApiError {
        code: u16,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Tools were attached to a model that carries a context cache reference.
    #[error("{0}")]
    ToolCacheConflict(Box<ToolCacheConflict>),
}

impl LlmError {
    /// Create an API error without details.
    pub fn api_error(code: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create an API error carrying the raw provider body.
    pub fn api_error_with_details(
        code: u16,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self::ApiError {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    /// HTTP status code, when the error came from an HTTP response.
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiError { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigurationError(_) => ErrorCategory::Configuration,
            Self::InvalidParameter(_) | Self::InvalidInput(_) => ErrorCategory::Validation,
            Self::UnsupportedOperation(_) => ErrorCategory::Unsupported,
            Self::ParseError(_) | Self::JsonError(_) => ErrorCategory::Parsing,
            Self::HttpError(_) => ErrorCategory::Network,
            Self::AuthenticationError(_) => ErrorCategory::Authentication,
            Self::ToolCacheConflict(_) => ErrorCategory::Conflict,
            Self::ApiError { code, .. } => match *code {
                401 => ErrorCategory::Authentication,
                429 => ErrorCategory::RateLimit,
                400..=499 => ErrorCategory::Client,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Unknown,
            },
        }
    }

    /// Whether the caller may reasonably retry. This crate never retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::RateLimit | ErrorCategory::Server | ErrorCategory::Network
        )
    }

    /// Structured conflict payload, if this is a tools/cache conflict.
    pub fn as_tool_cache_conflict(&self) -> Option<&ToolCacheConflict> {
        match self {
            Self::ToolCacheConflict(conflict) => Some(conflict),
            _ => None,
        }
    }
}
