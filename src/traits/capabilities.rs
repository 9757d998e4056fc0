//! ProviderCapabilities structure

use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderCapabilities {
    pub chat: bool,
    pub tools: bool,
    pub structured_output: bool,
    /// Server-side context cache (`cachedContent`)
    pub context_cache: bool,
    /// Search grounding (retrieval-augmented generation)
    pub grounding: bool,
    pub custom_features: HashMap<String, bool>,
}

impl ProviderCapabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chat(mut self) -> Self {
        self.chat = true;
        self
    }
    pub fn with_tools(mut self) -> Self {
        self.tools = true;
        self
    }
    pub fn with_structured_output(mut self) -> Self {
        self.structured_output = true;
        self
    }
    pub fn with_context_cache(mut self) -> Self {
        self.context_cache = true;
        self
    }
    pub fn with_grounding(mut self) -> Self {
        self.grounding = true;
        self
    }
    pub fn with_custom_feature(mut self, name: &str, enabled: bool) -> Self {
        self.custom_features.insert(name.to_string(), enabled);
        self
    }

    pub fn supports(&self, feature: &str) -> bool {
        match feature {
            "chat" => self.chat,
            "tools" => self.tools,
            "structured_output" => self.structured_output,
            "context_cache" | "cached_content" => self.context_cache,
            "grounding" => self.grounding,
            _ => self.custom_features.get(feature).copied().unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supports_aliases_and_custom_flags() {
        let caps = ProviderCapabilities::new()
            .with_chat()
            .with_context_cache()
            .with_custom_feature("thinking", true);
        assert!(caps.supports("chat"));
        assert!(caps.supports("cached_content"));
        assert!(caps.supports("thinking"));
        assert!(!caps.supports("tools"));
        assert!(!caps.supports("unknown"));
    }
}
