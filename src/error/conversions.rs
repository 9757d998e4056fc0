//! Conversions from third-party error types.

use super::LlmError;

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::ParseError(format!("Failed to decode response body: {err}"))
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<validator::ValidationErrors> for LlmError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ConfigurationError(format!("Invalid configuration: {err}"))
    }
}

#[cfg(feature = "gcp")]
impl From<jsonwebtoken::errors::Error> for LlmError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::ConfigurationError(format!("Failed to sign service account JWT: {err}"))
    }
}
