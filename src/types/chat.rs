//! Chat message, per-call option and result envelope types

use serde::{Deserialize, Serialize};

use super::{CacheReference, Tool, ToolCall, ToolChoice, Usage};

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    /// Tool calls previously emitted by the assistant
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// For tool results: the id of the call being answered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// For tool results: the function name being answered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChatMessage {
    fn with_role(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(MessageRole::Assistant, content)
    }

    /// Assistant turn that requested tool calls
    pub fn assistant_with_tool_calls(content: impl Into<String>, calls: Vec<ToolCall>) -> Self {
        let mut msg = Self::with_role(MessageRole::Assistant, content);
        msg.tool_calls = calls;
        msg
    }

    /// Result of executing a tool. `content` should be JSON when possible.
    pub fn tool_result(
        call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let mut msg = Self::with_role(MessageRole::Tool, content);
        msg.tool_call_id = Some(call_id.into());
        msg.name = Some(name.into());
        msg
    }
}

/// Per-call parameter set.
///
/// A bound handle keeps its own `CallOptions` and merges it into every call with
/// [`CallOptions::merged_with`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallOptions {
    pub cached_content: Option<CacheReference>,
    pub tools: Vec<Tool>,
    pub tool_choice: Option<ToolChoice>,
    pub stop_sequences: Vec<String>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cached_content(mut self, cache: CacheReference) -> Self {
        self.cached_content = Some(cache);
        self
    }

    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }

    pub fn with_stop_sequences(mut self, stop: Vec<String>) -> Self {
        self.stop_sequences = stop;
        self
    }

    /// Merge a bound parameter set into this per-call set.
    ///
    /// The bound `cached_content` always wins; for the other fields the per-call
    /// value is kept and the bound value only fills gaps.
    pub fn merged_with(mut self, bound: &CallOptions) -> Self {
        if bound.cached_content.is_some() {
            self.cached_content = bound.cached_content.clone();
        }
        if self.tools.is_empty() {
            self.tools = bound.tools.clone();
        }
        if self.tool_choice.is_none() {
            self.tool_choice = bound.tool_choice.clone();
        }
        if self.stop_sequences.is_empty() {
            self.stop_sequences = bound.stop_sequences.clone();
        }
        self
    }
}

/// Assistant message inside a generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Snake-case usage block (`input_tokens`, `output_tokens`, `input_token_details`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<serde_json::Value>,
}

/// One candidate generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub text: String,
    pub message: AssistantMessage,
    #[serde(
        default,
        rename = "generationInfo",
        skip_serializing_if = "Option::is_none"
    )]
    pub generation_info: Option<serde_json::Value>,
}

/// Completion result envelope.
///
/// The serialised form is the usage envelope consumed by [`crate::usage::parse_usage`]:
/// `{"generations": [[...]], "llmOutput": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub generations: Vec<Vec<Generation>>,
    #[serde(default, rename = "llmOutput", skip_serializing_if = "Option::is_none")]
    pub llm_output: Option<serde_json::Value>,
}

impl ChatResponse {
    fn first(&self) -> Option<&Generation> {
        self.generations.first().and_then(|g| g.first())
    }

    /// Text of the first generation
    pub fn text(&self) -> Option<&str> {
        self.first().map(|g| g.text.as_str())
    }

    /// Tool calls requested by the first generation
    pub fn tool_calls(&self) -> &[ToolCall] {
        self.first()
            .map(|g| g.message.tool_calls.as_slice())
            .unwrap_or_default()
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls().is_empty()
    }

    /// Normalised usage, parsed from this envelope's own serialised form.
    ///
    /// Does not log; the model logs usage once when the completion arrives.
    pub fn usage(&self) -> Usage {
        serde_json::to_value(self)
            .map(|envelope| crate::usage::parse_usage_with_source(&envelope).0)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bound_cache_always_wins() {
        let cache = CacheReference::new("cachedContents/a").unwrap();
        let bound = CallOptions::new().with_cached_content(cache);
        let per_call = CallOptions::new()
            .with_cached_content(CacheReference::new("cachedContents/b").unwrap())
            .with_stop_sequences(vec!["END".into()]);
        let merged = per_call.merged_with(&bound);
        assert_eq!(merged.cached_content.unwrap().as_str(), "cachedContents/a");
        assert_eq!(merged.stop_sequences, vec!["END".to_string()]);
    }

    #[test]
    fn merging_twice_does_not_duplicate() {
        let bound = CallOptions::new()
            .with_cached_content(CacheReference::new("cachedContents/a").unwrap())
            .with_stop_sequences(vec!["END".into()]);
        let once = CallOptions::new().merged_with(&bound);
        let twice = once.clone().merged_with(&bound);
        assert_eq!(once, twice);
    }

    #[test]
    fn envelope_shape() {
        let response = ChatResponse {
            generations: vec![vec![Generation {
                text: "hi".into(),
                message: AssistantMessage {
                    content: "hi".into(),
                    tool_calls: vec![],
                    usage_metadata: Some(json!({"input_tokens": 3, "output_tokens": 4})),
                },
                generation_info: None,
            }]],
            llm_output: None,
        };
        let v = serde_json::to_value(&response).unwrap();
        assert_eq!(v["generations"][0][0]["message"]["usage_metadata"]["input_tokens"], 3);
        assert!(v.get("llmOutput").is_none());
        assert_eq!(response.text(), Some("hi"));
        assert!(!response.has_tool_calls());
        assert_eq!(response.usage(), Usage::new(3, 4));
    }
}
