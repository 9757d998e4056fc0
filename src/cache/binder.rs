//! Capability-preserving cache binder.
//!
//! `CacheBoundModel` owns the base model and re-declares every capability the
//! host probes for (tool binding, structured output, identity), so wrapping a
//! model to inject `cachedContent` never hides what the model can do.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::guard::{CacheConflictPolicy, ToolCacheGuard, resolve_grounding};
use crate::error::LlmError;
use crate::traits::{
    BindToolsOptions, LanguageModel, ModelIdentity, ProviderCapabilities,
    StructuredOutputCapability, ToolBindingCapability,
};
use crate::types::{CacheReference, CallOptions, ChatMessage, ChatResponse, Tool};

/// Builds [`CacheBoundModel`]s under a conflict policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct CachedContentBinder {
    policy: CacheConflictPolicy,
}

impl CachedContentBinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: CacheConflictPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> CacheConflictPolicy {
        self.policy
    }

    /// Wrap `base` so every call carries `cache`.
    ///
    /// Fails immediately when the base model cannot bind tools. Binding an
    /// already bound model replaces its cache reference instead of stacking.
    pub fn bind(
        &self,
        base: Arc<dyn LanguageModel>,
        cache: CacheReference,
    ) -> Result<CacheBoundModel, LlmError> {
        let base = match base.as_any().downcast_ref::<CacheBoundModel>() {
            Some(bound) => bound.base.clone(),
            None => base,
        };

        let identity = base.identity();
        let Some(attached) = base.as_tool_binding().map(|b| b.attached_tools()) else {
            return Err(LlmError::ConfigurationError(format!(
                "model '{}' from provider '{}' does not support tool binding; \
                 cached content cannot be attached",
                identity.model_id, identity.provider_id
            )));
        };

        // Tools bound before the cache face the same guard as later ones.
        let base = if attached.is_empty() {
            base
        } else {
            ToolCacheGuard::check(attached, Some(&cache), self.policy.tools)?;
            strip_tools(&base)?
        };

        resolve_grounding(base.capabilities().grounding, Some(&cache), self.policy.grounding)?;

        debug!(
            provider = %identity.provider_id,
            model = %identity.model_id,
            cached_content = %cache,
            "Bound cached content to model"
        );
        Ok(CacheBoundModel {
            base,
            cache_reference: cache,
            identity,
            policy: self.policy,
        })
    }
}

fn strip_tools(base: &Arc<dyn LanguageModel>) -> Result<Arc<dyn LanguageModel>, LlmError> {
    base.as_tool_binding()
        .ok_or_else(|| {
            LlmError::ConfigurationError("base model lost its tool binding capability".into())
        })?
        .bind_tools(Vec::new(), BindToolsOptions::default())
}

/// A model whose every call carries a context cache reference.
#[derive(Clone)]
pub struct CacheBoundModel {
    base: Arc<dyn LanguageModel>,
    cache_reference: CacheReference,
    identity: ModelIdentity,
    policy: CacheConflictPolicy,
}

static_assertions::assert_impl_all!(CacheBoundModel: Send, Sync);

impl CacheBoundModel {
    pub fn cache_reference(&self) -> &CacheReference {
        &self.cache_reference
    }

    pub fn policy(&self) -> CacheConflictPolicy {
        self.policy
    }

    /// The wrapped model
    pub fn base(&self) -> &Arc<dyn LanguageModel> {
        &self.base
    }

    /// Parameter set merged into every call
    pub fn bound_options(&self) -> CallOptions {
        CallOptions::new().with_cached_content(self.cache_reference.clone())
    }

    /// Same cache and policy around a derived base model
    fn rederive(&self, base: Arc<dyn LanguageModel>) -> Self {
        Self {
            identity: base.identity(),
            base,
            cache_reference: self.cache_reference.clone(),
            policy: self.policy,
        }
    }
}

impl std::fmt::Debug for CacheBoundModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheBoundModel")
            .field("cache_reference", &self.cache_reference)
            .field("identity", &self.identity)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl LanguageModel for CacheBoundModel {
    fn identity(&self) -> ModelIdentity {
        self.identity.clone()
    }

    fn capabilities(&self) -> ProviderCapabilities {
        let mut caps = self.base.capabilities().with_context_cache();
        caps.grounding = false;
        caps
    }

    async fn generate(
        &self,
        messages: Vec<ChatMessage>,
        options: CallOptions,
    ) -> Result<ChatResponse, LlmError> {
        let mut options = options.merged_with(&self.bound_options());
        let tools = std::mem::take(&mut options.tools);
        options.tools =
            ToolCacheGuard::check(tools, Some(&self.cache_reference), self.policy.tools)?;
        self.base.generate(messages, options).await
    }

    fn as_tool_binding(&self) -> Option<&dyn ToolBindingCapability> {
        Some(self)
    }

    fn as_structured_output(&self) -> Option<&dyn StructuredOutputCapability> {
        self.base.as_structured_output().map(|_| self as &dyn StructuredOutputCapability)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ToolBindingCapability for CacheBoundModel {
    fn bind_tools(
        &self,
        tools: Vec<Tool>,
        options: BindToolsOptions,
    ) -> Result<Arc<dyn LanguageModel>, LlmError> {
        let tools = ToolCacheGuard::check(tools, Some(&self.cache_reference), self.policy.tools)?;
        let binder = self.base.as_tool_binding().ok_or_else(|| {
            LlmError::ConfigurationError("base model lost its tool binding capability".into())
        })?;
        let rebound = binder.bind_tools(tools, options)?;
        Ok(Arc::new(self.rederive(rebound)))
    }

    fn attached_tools(&self) -> Vec<Tool> {
        self.base
            .as_tool_binding()
            .map(|b| b.attached_tools())
            .unwrap_or_default()
    }
}

impl StructuredOutputCapability for CacheBoundModel {
    fn with_structured_output(
        &self,
        schema: serde_json::Value,
    ) -> Result<Arc<dyn LanguageModel>, LlmError> {
        let structured = self.base.as_structured_output().ok_or_else(|| {
            LlmError::UnsupportedOperation(format!(
                "model '{}' does not support structured output",
                self.identity.model_id
            ))
        })?;
        let derived = structured.with_structured_output(schema)?;
        Ok(Arc::new(self.rederive(derived)))
    }
}
