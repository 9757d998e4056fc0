//! Usage-metadata parsing
//!
//! Normalises a completion result envelope into a [`Usage`] record. Vendor SDKs
//! report token accounting in several shapes; the strategies below are tried in
//! a fixed order and the first one that finds a non-zero prompt or completion
//! count wins. Shapes are never merged.
//!
//! An envelope with no recognisable usage yields all-zero counts, not an error.

mod json_path;
mod strategies;

use serde_json::Value;
use tracing::{debug, info};

use crate::types::Usage;

/// Share of the normal input price waived for tokens read from a context cache.
pub const CACHED_READ_DISCOUNT: f64 = 0.75;

/// A named extraction strategy.
#[derive(Clone, Copy)]
pub struct UsageStrategy {
    pub name: &'static str,
    pub extract: fn(&Value) -> Option<Usage>,
}

impl std::fmt::Debug for UsageStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageStrategy")
            .field("name", &self.name)
            .finish()
    }
}

/// Strategies in priority order.
pub const STRATEGIES: [UsageStrategy; 4] = [
    UsageStrategy {
        name: "token_usage",
        extract: strategies::token_usage,
    },
    UsageStrategy {
        name: "usage_metadata_snake",
        extract: strategies::usage_metadata_snake,
    },
    UsageStrategy {
        name: "usage_metadata_camel",
        extract: strategies::usage_metadata_camel,
    },
    UsageStrategy {
        name: "generation_message",
        extract: strategies::generation_message,
    },
];

/// Parse usage and report which strategy matched (`None` for the zero fallback).
pub fn parse_usage_with_source(envelope: &Value) -> (Usage, Option<&'static str>) {
    STRATEGIES
        .iter()
        .find_map(|s| (s.extract)(envelope).map(|u| (u, Some(s.name))))
        .unwrap_or((Usage::default(), None))
}

/// Parse usage from an envelope and emit one diagnostic line.
pub fn parse_usage(envelope: &Value) -> Usage {
    let (usage, source) = parse_usage_with_source(envelope);
    log_usage(&usage, source);
    usage
}

fn log_usage(usage: &Usage, source: Option<&'static str>) {
    let source = source.unwrap_or("none");
    match (usage.cached_tokens, usage.cached_input_share()) {
        (Some(cached), Some(share)) => {
            info!(
                source,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                cached_tokens = cached,
                cache_share_pct = %format!("{:.1}", share * 100.0),
                input_discount_pct = %format!("{:.1}", share * CACHED_READ_DISCOUNT * 100.0),
                "Token usage with context cache hit"
            );
        }
        _ => {
            debug!(
                source,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "Token usage"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strategy_order_is_stable() {
        let names: Vec<_> = STRATEGIES.iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            [
                "token_usage",
                "usage_metadata_snake",
                "usage_metadata_camel",
                "generation_message"
            ]
        );
    }

    #[test]
    fn first_match_wins_without_merging() {
        let v = json!({
            "llmOutput": {
                "tokenUsage": {"promptTokens": 1, "completionTokens": 2},
                "usage_metadata": {"input_tokens": 9, "output_tokens": 9,
                    "input_token_details": {"cache_read": 7}}
            }
        });
        let (usage, source) = parse_usage_with_source(&v);
        assert_eq!(source, Some("token_usage"));
        assert_eq!(usage, Usage::new(1, 2));
    }

    #[test]
    fn empty_envelope_is_all_zero() {
        let (usage, source) = parse_usage_with_source(&json!({}));
        assert_eq!(source, None);
        assert_eq!(usage, Usage::default());
    }
}
