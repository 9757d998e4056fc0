//! Vertex AI Gemini client
//!
//! The base chat model: one `generateContent` call per `generate`, no streaming,
//! no retries. Vendor and transport failures surface unchanged.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use tracing::debug;

use super::config::VertexGeminiConfig;
use super::convert::{
    convert_json_schema_to_openapi_schema, function_declarations, messages_to_contents,
    response_to_chat, tool_config,
};
use super::types::{
    GeminiTool, GenerateContentRequest, GenerateContentResponse, GenerationConfig, GoogleSearch,
    ThinkingConfig,
};
use crate::auth::TokenProvider;
use crate::error::LlmError;
use crate::traits::{
    BindToolsOptions, LanguageModel, ModelIdentity, ProviderCapabilities,
    StructuredOutputCapability, ToolBindingCapability,
};
use crate::types::{CallOptions, ChatMessage, ChatResponse, Tool, ToolChoice};
use crate::usage::parse_usage;

pub const PROVIDER_ID: &str = "vertex";

/// Vertex Gemini chat model.
///
/// Cloning is cheap; `bind_tools` and `with_structured_output` return modified
/// clones and leave the receiver untouched.
#[derive(Clone)]
pub struct VertexGeminiClient {
    http_client: HttpClient,
    config: Arc<VertexGeminiConfig>,
    token_provider: Arc<dyn TokenProvider>,
    bound_tools: Vec<Tool>,
    tool_choice: Option<ToolChoice>,
    response_schema: Option<serde_json::Value>,
}

static_assertions::assert_impl_all!(VertexGeminiClient: Send, Sync);

impl VertexGeminiClient {
    /// Create a new client; the configuration is validated here.
    pub fn new(
        config: VertexGeminiConfig,
        token_provider: Arc<dyn TokenProvider>,
    ) -> Result<Self, LlmError> {
        let http_client = HttpClient::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                LlmError::ConfigurationError(format!("Failed to create HTTP client: {e}"))
            })?;
        Self::with_http_client(config, token_provider, http_client)
    }

    /// Create a new client with a caller-supplied HTTP client
    pub fn with_http_client(
        config: VertexGeminiConfig,
        token_provider: Arc<dyn TokenProvider>,
        http_client: HttpClient,
    ) -> Result<Self, LlmError> {
        config.validate_params()?;
        Ok(Self {
            http_client,
            config: Arc::new(config),
            token_provider,
            bound_tools: Vec::new(),
            tool_choice: None,
            response_schema: None,
        })
    }

    pub fn config(&self) -> &VertexGeminiConfig {
        &self.config
    }

    pub fn bound_tools(&self) -> &[Tool] {
        &self.bound_tools
    }

    /// Build the request body for one call.
    pub fn build_request(
        &self,
        messages: &[ChatMessage],
        options: &CallOptions,
    ) -> Result<GenerateContentRequest, LlmError> {
        let cached_content = options.cached_content.as_ref();
        let (system_instruction, contents) =
            messages_to_contents(messages, cached_content.is_some())?;

        let tools: &[Tool] = if !options.tools.is_empty() {
            &options.tools
        } else if cached_content.is_some() {
            if !self.bound_tools.is_empty() {
                debug!(
                    provider = PROVIDER_ID,
                    model = %self.config.model,
                    tools = self.bound_tools.len(),
                    "Bound tools skipped: request carries cached content"
                );
            }
            &[]
        } else {
            &self.bound_tools
        };

        let mut gemini_tools = Vec::new();
        let declarations = function_declarations(tools);
        if !declarations.is_empty() {
            gemini_tools.push(GeminiTool::FunctionDeclarations {
                function_declarations: declarations,
            });
        }
        if self.config.google_search_grounding {
            if cached_content.is_some() {
                debug!(
                    provider = PROVIDER_ID,
                    model = %self.config.model,
                    "Search grounding skipped: request carries cached content"
                );
            } else {
                gemini_tools.push(GeminiTool::GoogleSearch {
                    google_search: GoogleSearch::default(),
                });
            }
        }

        let function_calling = if tools.is_empty() {
            None
        } else {
            options
                .tool_choice
                .as_ref()
                .or(self.tool_choice.as_ref())
                .map(tool_config)
        };

        let response_schema = self
            .response_schema
            .as_ref()
            .and_then(|schema| convert_json_schema_to_openapi_schema(schema, true));

        let generation_config = GenerationConfig {
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            top_k: self.config.top_k,
            max_output_tokens: self.config.max_output_tokens,
            stop_sequences: (!options.stop_sequences.is_empty())
                .then(|| options.stop_sequences.clone()),
            response_mime_type: self
                .response_schema
                .as_ref()
                .map(|_| "application/json".to_string()),
            response_schema,
            thinking_config: self.config.thinking_budget.map(|budget| ThinkingConfig {
                thinking_budget: Some(budget),
            }),
        };

        Ok(GenerateContentRequest {
            contents,
            system_instruction,
            tools: (!gemini_tools.is_empty()).then_some(gemini_tools),
            tool_config: function_calling,
            safety_settings: (!self.config.safety_settings.is_empty())
                .then(|| self.config.safety_settings.clone()),
            generation_config: (generation_config != GenerationConfig::default())
                .then_some(generation_config),
            cached_content: cached_content.map(|c| c.as_str().to_string()),
        })
    }

    async fn send(&self, request: &GenerateContentRequest) -> Result<ChatResponse, LlmError> {
        let token = self.token_provider.token().await?;
        let url = self.config.generate_content_url();

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let details = serde_json::from_str::<serde_json::Value>(&body).ok();
            let message = details
                .as_ref()
                .and_then(|d| d.pointer("/error/message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or(body);
            return Err(LlmError::ApiError {
                code: status.as_u16(),
                message,
                details,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        response_to_chat(parsed)
    }
}

impl std::fmt::Debug for VertexGeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VertexGeminiClient")
            .field("config", &self.config)
            .field("bound_tools", &self.bound_tools.len())
            .field("tool_choice", &self.tool_choice)
            .field("structured_output", &self.response_schema.is_some())
            .finish()
    }
}

#[async_trait]
impl LanguageModel for VertexGeminiClient {
    fn identity(&self) -> ModelIdentity {
        ModelIdentity::new(PROVIDER_ID, self.config.model.clone())
            .with_namespace(["chat_models", "vertex", "gemini"])
            .with_type_tags(["BaseChatModel", "VertexGeminiClient"])
            .with_structured_output(true)
    }

    fn capabilities(&self) -> ProviderCapabilities {
        let caps = ProviderCapabilities::new()
            .with_chat()
            .with_tools()
            .with_structured_output()
            .with_context_cache()
            .with_custom_feature("thinking", self.config.thinking_budget.is_some());
        if self.config.google_search_grounding {
            caps.with_grounding()
        } else {
            caps
        }
    }

    async fn generate(
        &self,
        messages: Vec<ChatMessage>,
        options: CallOptions,
    ) -> Result<ChatResponse, LlmError> {
        let request = self.build_request(&messages, &options)?;
        debug!(
            provider = PROVIDER_ID,
            model = %self.config.model,
            cached_content = ?request.cached_content,
            messages = request.contents.len(),
            "Sending generateContent request"
        );
        let response = self.send(&request).await?;
        // One usage line per completion
        parse_usage(&serde_json::to_value(&response)?);
        Ok(response)
    }

    fn as_tool_binding(&self) -> Option<&dyn ToolBindingCapability> {
        Some(self)
    }

    fn as_structured_output(&self) -> Option<&dyn StructuredOutputCapability> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ToolBindingCapability for VertexGeminiClient {
    fn bind_tools(
        &self,
        tools: Vec<Tool>,
        options: BindToolsOptions,
    ) -> Result<Arc<dyn LanguageModel>, LlmError> {
        let mut bound = self.clone();
        bound.bound_tools = tools;
        bound.tool_choice = options.tool_choice;
        Ok(Arc::new(bound))
    }

    fn attached_tools(&self) -> Vec<Tool> {
        self.bound_tools.clone()
    }
}

impl StructuredOutputCapability for VertexGeminiClient {
    fn with_structured_output(
        &self,
        schema: serde_json::Value,
    ) -> Result<Arc<dyn LanguageModel>, LlmError> {
        if !schema.is_object() {
            return Err(LlmError::InvalidParameter(
                "structured output schema must be a JSON object".to_string(),
            ));
        }
        let mut bound = self.clone();
        bound.response_schema = Some(schema);
        Ok(Arc::new(bound))
    }
}
