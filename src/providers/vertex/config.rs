//! Vertex Gemini client configuration

use std::time::Duration;

use validator::Validate;

use super::types::SafetySetting;
use crate::auth::vertex::{GOOGLE_PUBLISHER, vertex_base_url};
use crate::error::LlmError;

pub const DEFAULT_LOCATION: &str = "us-central1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Immutable generation parameters and endpoint settings for one model.
#[derive(Clone, Validate)]
pub struct VertexGeminiConfig {
    #[validate(length(min = 1, message = "model must not be empty"))]
    pub model: String,
    #[validate(length(min = 1, message = "project must not be empty"))]
    pub project: String,
    #[validate(length(min = 1, message = "location must not be empty"))]
    pub location: String,
    /// Overrides the computed publisher base URL (tests, proxies)
    pub base_url: Option<String>,
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: Option<f32>,
    #[validate(range(min = 0.0, max = 1.0))]
    pub top_p: Option<f32>,
    #[validate(range(min = 1))]
    pub top_k: Option<u32>,
    #[validate(range(min = 1))]
    pub max_output_tokens: Option<u32>,
    /// -1 enables dynamic thinking
    #[validate(range(min = -1))]
    pub thinking_budget: Option<i32>,
    pub safety_settings: Vec<SafetySetting>,
    pub google_search_grounding: bool,
    pub timeout: Duration,
}

impl VertexGeminiConfig {
    pub fn new(project: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            project: project.into(),
            location: DEFAULT_LOCATION.to_string(),
            base_url: None,
            temperature: None,
            top_p: None,
            top_k: None,
            max_output_tokens: None,
            thinking_budget: None,
            safety_settings: Vec::new(),
            google_search_grounding: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn validate_params(&self) -> Result<(), LlmError> {
        self.validate()?;
        Ok(())
    }

    /// Publisher base URL, honouring the override
    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => vertex_base_url(&self.project, &self.location, GOOGLE_PUBLISHER),
        }
    }

    pub fn generate_content_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url(), self.model)
    }
}

impl std::fmt::Debug for VertexGeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VertexGeminiConfig")
            .field("model", &self.model)
            .field("project", &self.project)
            .field("location", &self.location)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("top_k", &self.top_k)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("thinking_budget", &self.thinking_budget)
            .field("safety_settings", &self.safety_settings.len())
            .field("google_search_grounding", &self.google_search_grounding)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_uses_regional_host() {
        let config = VertexGeminiConfig::new("proj", "gemini-2.5-flash");
        assert_eq!(
            config.generate_content_url(),
            "https://us-central1-aiplatform.googleapis.com/v1/projects/proj/locations/us-central1/publishers/google/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn base_url_override_trims_slash() {
        let mut config = VertexGeminiConfig::new("proj", "m");
        config.base_url = Some("http://127.0.0.1:9999/v1/".into());
        assert_eq!(
            config.generate_content_url(),
            "http://127.0.0.1:9999/v1/models/m:generateContent"
        );
    }

    #[test]
    fn out_of_range_parameters_are_rejected() {
        let mut config = VertexGeminiConfig::new("proj", "m");
        config.temperature = Some(2.5);
        assert!(config.validate_params().is_err());

        let mut config = VertexGeminiConfig::new("proj", "m");
        config.thinking_budget = Some(-1);
        config.top_k = Some(40);
        assert!(config.validate_params().is_ok());

        let config = VertexGeminiConfig::new("", "m");
        assert!(matches!(
            config.validate_params(),
            Err(LlmError::ConfigurationError(_))
        ));
    }
}
