//! Extraction strategies for the usage envelope shapes seen in the wild.
//!
//! Each strategy is a pure function over the whole envelope and yields `None`
//! unless it found a non-zero prompt or completion count.

use serde_json::Value;

use super::json_path::{get_path, read_first_count};
use crate::types::Usage;

fn non_empty(usage: Usage) -> Option<Usage> {
    (!usage.is_empty()).then_some(usage)
}

/// `llmOutput.tokenUsage.{promptTokens, completionTokens}`
pub(crate) fn token_usage(envelope: &Value) -> Option<Usage> {
    let block = get_path(envelope, "llmOutput.tokenUsage")?;
    let prompt = read_first_count(block, &["promptTokens"]).unwrap_or(0);
    let completion = read_first_count(block, &["completionTokens"]).unwrap_or(0);
    non_empty(Usage::new(prompt, completion))
}

/// Snake-case block: `{input_tokens, output_tokens, input_token_details.cache_read}`
fn snake_block(block: &Value) -> Option<Usage> {
    let prompt = read_first_count(block, &["input_tokens"]).unwrap_or(0);
    let completion = read_first_count(block, &["output_tokens"]).unwrap_or(0);
    let cached = read_first_count(block, &["input_token_details.cache_read"]);
    non_empty(Usage::new(prompt, completion).with_cached_tokens(cached))
}

/// `llmOutput.usage_metadata`
pub(crate) fn usage_metadata_snake(envelope: &Value) -> Option<Usage> {
    snake_block(get_path(envelope, "llmOutput.usage_metadata")?)
}

/// `llmOutput.usageMetadata`, vendor camelCase with snake fallbacks per field
pub(crate) fn usage_metadata_camel(envelope: &Value) -> Option<Usage> {
    let block = get_path(envelope, "llmOutput.usageMetadata")?;
    let prompt = read_first_count(block, &["promptTokenCount", "input_tokens"]).unwrap_or(0);
    let completion =
        read_first_count(block, &["candidatesTokenCount", "output_tokens"]).unwrap_or(0);
    let cached = read_first_count(
        block,
        &["cachedContentTokenCount", "cached_content_token_count"],
    );
    non_empty(Usage::new(prompt, completion).with_cached_tokens(cached))
}

/// `generations[0][0].message.usage_metadata`
pub(crate) fn generation_message(envelope: &Value) -> Option<Usage> {
    snake_block(get_path(envelope, "generations[0][0].message.usage_metadata")?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn zero_counts_do_not_match() {
        let v = json!({"llmOutput": {"tokenUsage": {"promptTokens": 0, "completionTokens": 0}}});
        assert_eq!(token_usage(&v), None);
    }

    #[test]
    fn camel_block_accepts_snake_field_names() {
        let v = json!({"llmOutput": {"usageMetadata": {
            "input_tokens": 10,
            "output_tokens": 2,
            "cached_content_token_count": 8
        }}});
        let usage = usage_metadata_camel(&v).unwrap();
        assert_eq!(usage, Usage::new(10, 2).with_cached_tokens(Some(8)));
    }

    #[test]
    fn message_level_block() {
        let v = json!({"generations": [[{"message": {"usage_metadata": {
            "input_tokens": 1,
            "output_tokens": 1,
            "input_token_details": {"cache_read": 5000}
        }}}]]});
        assert_eq!(generation_message(&v).unwrap().cached_tokens, Some(5000));
        assert_eq!(usage_metadata_snake(&v), None);
    }
}
