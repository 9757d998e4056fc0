//! Vertex Gemini builder
//!
//! Resolves project, credentials and cache settings into a ready model. Missing
//! model, project or credentials fail here, before any request is made.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::client::VertexGeminiClient;
use super::config::{DEFAULT_LOCATION, DEFAULT_TIMEOUT, VertexGeminiConfig};
use super::types::SafetySetting;
#[cfg(feature = "gcp")]
use crate::auth::service_account::{ServiceAccountCredentials, ServiceAccountTokenProvider};
use crate::auth::{StaticTokenProvider, TokenProvider};
use crate::cache::{CacheConflictPolicy, CachedContentBinder, resolve_grounding};
use crate::error::LlmError;
use crate::traits::LanguageModel;
use crate::types::CacheReference;

/// Assembles a Vertex Gemini model, optionally bound to a context cache.
///
/// # Example
/// ```rust,no_run
/// use vertex_cache_chat::providers::vertex::VertexGeminiBuilder;
///
/// # fn main() -> Result<(), vertex_cache_chat::LlmError> {
/// let model = VertexGeminiBuilder::new()
///     .project("my-project")
///     .location("europe-west4")
///     .model("gemini-2.5-flash")
///     .access_token("ya29...")
///     .temperature(0.2)
///     .cached_content("projects/my-project/locations/europe-west4/cachedContents/123")
///     .build()?;
/// # let _ = model;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct VertexGeminiBuilder {
    project: Option<String>,
    location: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    temperature: Option<f32>,
    top_p: Option<f32>,
    top_k: Option<u32>,
    max_output_tokens: Option<u32>,
    thinking_budget: Option<i32>,
    safety_settings: Vec<SafetySetting>,
    google_search_grounding: bool,
    timeout: Option<Duration>,
    cached_content: Option<String>,
    policy: CacheConflictPolicy,
    token_provider: Option<Arc<dyn TokenProvider>>,
    #[cfg(feature = "gcp")]
    credentials: Option<ServiceAccountCredentials>,
    http_client: Option<reqwest::Client>,
}

impl VertexGeminiBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Google Cloud project; defaults to the service account's project
    pub fn project<S: Into<String>>(mut self, project: S) -> Self {
        self.project = Some(project.into());
        self
    }

    pub fn location<S: Into<String>>(mut self, location: S) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Override the publisher base URL
    pub fn base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub const fn top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub const fn top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub const fn max_output_tokens(mut self, max: u32) -> Self {
        self.max_output_tokens = Some(max);
        self
    }

    /// -1 for dynamic thinking
    pub const fn thinking_budget(mut self, budget: i32) -> Self {
        self.thinking_budget = Some(budget);
        self
    }

    pub fn safety_settings(mut self, settings: Vec<SafetySetting>) -> Self {
        self.safety_settings = settings;
        self
    }

    pub const fn google_search_grounding(mut self, enabled: bool) -> Self {
        self.google_search_grounding = enabled;
        self
    }

    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Context cache name. Blank input means "no cache".
    pub fn cached_content<S: Into<String>>(mut self, name: S) -> Self {
        self.cached_content = Some(name.into());
        self
    }

    pub const fn conflict_policy(mut self, policy: CacheConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.token_provider = Some(provider);
        self
    }

    /// Use a pre-minted OAuth access token
    pub fn access_token<S: Into<String>>(self, token: S) -> Self {
        self.token_provider(Arc::new(StaticTokenProvider::new(token)))
    }

    #[cfg(feature = "gcp")]
    pub fn service_account(mut self, credentials: ServiceAccountCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    fn resolve_project(&self) -> Option<String> {
        let explicit = self.project.as_deref().map(str::trim).filter(|p| !p.is_empty());
        #[cfg(feature = "gcp")]
        let fallback = self
            .credentials
            .as_ref()
            .and_then(|c| c.project_id.as_deref());
        #[cfg(not(feature = "gcp"))]
        let fallback: Option<&str> = None;
        explicit.or(fallback).map(str::to_string)
    }

    #[cfg_attr(not(feature = "gcp"), allow(unused_variables))]
    fn resolve_token_provider(
        &self,
        http: &reqwest::Client,
    ) -> Result<Arc<dyn TokenProvider>, LlmError> {
        if let Some(provider) = &self.token_provider {
            return Ok(provider.clone());
        }
        #[cfg(feature = "gcp")]
        if let Some(creds) = &self.credentials {
            return Ok(Arc::new(ServiceAccountTokenProvider::new(
                creds.clone(),
                http.clone(),
                None,
            )));
        }
        Err(LlmError::ConfigurationError(
            "Vertex AI requires credentials: set a token provider, access token or service account"
                .to_string(),
        ))
    }

    /// Build the model. No network calls are made here.
    pub fn build(self) -> Result<Arc<dyn LanguageModel>, LlmError> {
        let model = self
            .model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| LlmError::ConfigurationError("model is required".to_string()))?;
        let project = self.resolve_project().ok_or_else(|| {
            LlmError::ConfigurationError(
                "project is required (set it explicitly or use service account credentials with project_id)"
                    .to_string(),
            )
        })?;

        let cache = CacheReference::parse_optional(self.cached_content.as_deref());
        let grounding = resolve_grounding(
            self.google_search_grounding,
            cache.as_ref(),
            self.policy.grounding,
        )?;

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let http = match &self.http_client {
            Some(client) => client.clone(),
            None => reqwest::Client::builder().timeout(timeout).build().map_err(|e| {
                LlmError::ConfigurationError(format!("Failed to create HTTP client: {e}"))
            })?,
        };
        let token_provider = self.resolve_token_provider(&http)?;

        let mut config = VertexGeminiConfig::new(project, model);
        config.location = self
            .location
            .clone()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string());
        config.base_url = self.base_url.clone();
        config.temperature = self.temperature;
        config.top_p = self.top_p;
        config.top_k = self.top_k;
        config.max_output_tokens = self.max_output_tokens;
        config.thinking_budget = self.thinking_budget;
        config.safety_settings = self.safety_settings.clone();
        config.google_search_grounding = grounding;
        config.timeout = timeout;

        let client = VertexGeminiClient::with_http_client(config, token_provider, http)?;
        debug!(
            model = %client.config().model,
            project = %client.config().project,
            location = %client.config().location,
            cached = cache.is_some(),
            "Built Vertex Gemini model"
        );

        match cache {
            Some(cache) => {
                let bound = CachedContentBinder::with_policy(self.policy)
                    .bind(Arc::new(client), cache)?;
                Ok(Arc::new(bound))
            }
            None => Ok(Arc::new(client)),
        }
    }
}

impl std::fmt::Debug for VertexGeminiBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VertexGeminiBuilder")
            .field("project", &self.project)
            .field("location", &self.location)
            .field("model", &self.model)
            .field("cached_content", &self.cached_content)
            .field("google_search_grounding", &self.google_search_grounding)
            .field("policy", &self.policy)
            .field("has_token_provider", &self.token_provider.is_some())
            .finish_non_exhaustive()
    }
}
