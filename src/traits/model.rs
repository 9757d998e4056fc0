//! Chat model traits and capability accessors

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;

use super::ProviderCapabilities;
use crate::error::LlmError;
use crate::types::{CallOptions, ChatMessage, ChatResponse, Tool, ToolChoice};

/// Identity metadata a host inspects to decide whether an object is a chat model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelIdentity {
    pub provider_id: String,
    pub model_id: String,
    /// Namespace path, e.g. `["langchain", "chat_models", "vertexai"]`
    pub namespace: Vec<String>,
    /// Internal type tags, e.g. `["BaseChatModel", "ChatVertexAI"]`
    pub type_tags: Vec<String>,
    pub supports_structured_output: bool,
}

impl ModelIdentity {
    pub fn new(provider_id: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            model_id: model_id.into(),
            ..Default::default()
        }
    }

    pub fn with_namespace<I, S>(mut self, namespace: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.namespace = namespace.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_type_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.type_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_structured_output(mut self, supported: bool) -> Self {
        self.supports_structured_output = supported;
        self
    }
}

/// Options accepted by [`ToolBindingCapability::bind_tools`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindToolsOptions {
    pub tool_choice: Option<ToolChoice>,
}

impl BindToolsOptions {
    pub fn with_tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }
}

/// A configured chat model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn identity(&self) -> ModelIdentity;

    fn capabilities(&self) -> ProviderCapabilities;

    async fn generate(
        &self,
        messages: Vec<ChatMessage>,
        options: CallOptions,
    ) -> Result<ChatResponse, LlmError>;

    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<ChatResponse, LlmError> {
        self.generate(messages, CallOptions::default()).await
    }

    /// Tool binding, when the model supports it
    fn as_tool_binding(&self) -> Option<&dyn ToolBindingCapability> {
        None
    }

    /// Structured output, when the model supports it
    fn as_structured_output(&self) -> Option<&dyn StructuredOutputCapability> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

/// Attach tools, producing a new handle. The receiver is never mutated.
pub trait ToolBindingCapability: Send + Sync {
    fn bind_tools(
        &self,
        tools: Vec<Tool>,
        options: BindToolsOptions,
    ) -> Result<Arc<dyn LanguageModel>, LlmError>;

    /// Tools already attached to this handle
    fn attached_tools(&self) -> Vec<Tool> {
        Vec::new()
    }
}

/// Constrain output to a JSON schema, producing a new handle.
pub trait StructuredOutputCapability: Send + Sync {
    fn with_structured_output(
        &self,
        schema: serde_json::Value,
    ) -> Result<Arc<dyn LanguageModel>, LlmError>;
}

/// The host's capability probe: a namespace, type tags and a callable tool binder.
pub fn is_tool_calling_chat_model(model: &dyn LanguageModel) -> bool {
    let identity = model.identity();
    !identity.namespace.is_empty()
        && !identity.type_tags.is_empty()
        && model.as_tool_binding().is_some()
}
