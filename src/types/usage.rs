//! Normalised token usage record

use serde::{Deserialize, Serialize};

/// Token accounting for a single completion.
///
/// `total_tokens` is `prompt_tokens + completion_tokens` for every record built
/// with [`Usage::new`] or deserialized; an incoming `totalTokens` is ignored and
/// recomputed. Fields stay public for matching; a struct literal bypasses the
/// invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "UsageFields")]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cached_tokens: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageFields {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    cached_tokens: Option<u32>,
}

impl From<UsageFields> for Usage {
    fn from(fields: UsageFields) -> Self {
        Self::new(fields.prompt_tokens, fields.completion_tokens)
            .with_cached_tokens(fields.cached_tokens)
    }
}

impl Usage {
    pub const fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
            cached_tokens: None,
        }
    }

    /// Attach a cache-read count. Zero is treated as "no cache read".
    pub fn with_cached_tokens(mut self, cached: Option<u32>) -> Self {
        self.cached_tokens = cached.filter(|c| *c > 0);
        self
    }

    /// True when neither prompt nor completion tokens were counted.
    pub const fn is_empty(&self) -> bool {
        self.prompt_tokens == 0 && self.completion_tokens == 0
    }

    /// Cached tokens as a fraction of the prompt, if any were read from cache.
    pub fn cached_input_share(&self) -> Option<f64> {
        let cached = self.cached_tokens?;
        let prompt_side = self.prompt_tokens.max(cached);
        Some(f64::from(cached) / f64::from(prompt_side))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_is_sum() {
        let usage = Usage::new(6, 336);
        assert_eq!(usage.total_tokens, 342);
        assert!(usage.cached_tokens.is_none());
    }

    #[test]
    fn zero_cache_read_is_omitted() {
        let usage = Usage::new(1, 2).with_cached_tokens(Some(0));
        assert!(usage.cached_tokens.is_none());
        let v = serde_json::to_value(usage).unwrap();
        assert!(v.get("cachedTokens").is_none());
        assert_eq!(v["promptTokens"], 1);
    }

    #[test]
    fn deserialized_total_is_recomputed() {
        let usage: Usage = serde_json::from_value(serde_json::json!({
            "promptTokens": 1,
            "completionTokens": 2,
            "totalTokens": 99,
            "cachedTokens": 0
        }))
        .unwrap();
        assert_eq!(usage, Usage::new(1, 2));
    }

    #[test]
    fn cache_share_is_capped() {
        let usage = Usage::new(6, 336).with_cached_tokens(Some(55176));
        assert_eq!(usage.cached_input_share(), Some(1.0));
        let partial = Usage::new(100, 1).with_cached_tokens(Some(25));
        assert_eq!(partial.cached_input_share(), Some(0.25));
    }
}
