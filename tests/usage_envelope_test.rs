use proptest::prelude::*;
use serde_json::json;
use tracing_test::traced_test;

use vertex_cache_chat::Usage;
use vertex_cache_chat::usage::{parse_usage, parse_usage_with_source};

#[test]
fn scenario_a_snake_case_llm_output_with_cache_read() {
    let envelope = json!({
        "llmOutput": {
            "usage_metadata": {
                "input_tokens": 6,
                "output_tokens": 336,
                "input_token_details": {"cache_read": 55176}
            }
        }
    });
    let usage = parse_usage(&envelope);
    assert_eq!(
        usage,
        Usage {
            prompt_tokens: 6,
            completion_tokens: 336,
            total_tokens: 342,
            cached_tokens: Some(55176),
        }
    );
}

#[test]
fn scenario_b_token_usage_has_no_cached_key() {
    let envelope = json!({
        "llmOutput": {"tokenUsage": {"promptTokens": 50, "completionTokens": 100}}
    });
    let usage = parse_usage(&envelope);
    assert_eq!(usage, Usage::new(50, 100));
    assert_eq!(usage.total_tokens, 150);

    let record = serde_json::to_value(usage).unwrap();
    assert_eq!(
        record,
        json!({"promptTokens": 50, "completionTokens": 100, "totalTokens": 150})
    );
}

#[test]
fn camel_case_usage_metadata() {
    let envelope = json!({
        "llmOutput": {
            "usageMetadata": {
                "promptTokenCount": 1200,
                "candidatesTokenCount": 80,
                "totalTokenCount": 1280,
                "cachedContentTokenCount": 1000
            }
        }
    });
    let (usage, source) = parse_usage_with_source(&envelope);
    assert_eq!(source, Some("usage_metadata_camel"));
    assert_eq!(usage, Usage::new(1200, 80).with_cached_tokens(Some(1000)));
}

#[test]
fn message_level_usage_metadata() {
    let envelope = json!({
        "generations": [[{
            "text": "ok",
            "message": {
                "content": "ok",
                "usage_metadata": {
                    "input_tokens": 10,
                    "output_tokens": 20,
                    "input_token_details": {"cache_read": 5000}
                }
            }
        }]]
    });
    let (usage, source) = parse_usage_with_source(&envelope);
    assert_eq!(source, Some("generation_message"));
    assert_eq!(usage.cached_tokens, Some(5000));
    assert_eq!(usage.total_tokens, 30);
}

#[test]
fn cache_read_is_exact_at_both_levels() {
    let block = json!({
        "input_tokens": 7,
        "output_tokens": 3,
        "input_token_details": {"cache_read": 5000}
    });
    let top = json!({"llmOutput": {"usage_metadata": block.clone()}});
    let nested = json!({"generations": [[{"message": {"usage_metadata": block}}]]});
    assert_eq!(parse_usage(&top).cached_tokens, Some(5000));
    assert_eq!(parse_usage(&nested).cached_tokens, Some(5000));
}

#[test]
fn absent_cache_read_is_omitted_not_zero() {
    let envelope = json!({
        "llmOutput": {"usage_metadata": {"input_tokens": 7, "output_tokens": 3}}
    });
    let usage = parse_usage(&envelope);
    assert_eq!(usage.cached_tokens, None);
    assert!(serde_json::to_value(usage).unwrap().get("cachedTokens").is_none());
}

#[test]
fn zero_shapes_fall_through_to_later_strategies() {
    let envelope = json!({
        "llmOutput": {"tokenUsage": {"promptTokens": 0, "completionTokens": 0}},
        "generations": [[{"message": {"usage_metadata": {"input_tokens": 4, "output_tokens": 2}}}]]
    });
    let (usage, source) = parse_usage_with_source(&envelope);
    assert_eq!(source, Some("generation_message"));
    assert_eq!(usage, Usage::new(4, 2));
}

#[test]
fn unrecognised_envelope_degrades_to_zero() {
    for envelope in [
        json!({}),
        json!({"llmOutput": null}),
        json!({"generations": []}),
        json!({"llmOutput": {"tokenUsage": "garbage"}}),
    ] {
        assert_eq!(parse_usage(&envelope), Usage::default());
    }
}

#[traced_test]
#[test]
fn cache_hit_is_logged_with_discount() {
    let envelope = json!({
        "llmOutput": {"usage_metadata": {
            "input_tokens": 100,
            "output_tokens": 10,
            "input_token_details": {"cache_read": 50}
        }}
    });
    parse_usage(&envelope);
    assert!(logs_contain("Token usage with context cache hit"));
    assert!(logs_contain("cache_share_pct=50.0"));
    assert!(logs_contain("input_discount_pct=37.5"));
}

proptest! {
    #[test]
    fn total_is_always_prompt_plus_completion(
        prompt in 0u32..1_000_000,
        completion in 0u32..1_000_000,
        shape in 0usize..4,
    ) {
        let snake = json!({"input_tokens": prompt, "output_tokens": completion});
        let envelope = match shape {
            0 => json!({
                "llmOutput": {"tokenUsage": {"promptTokens": prompt, "completionTokens": completion}}
            }),
            1 => json!({"llmOutput": {"usage_metadata": snake}}),
            2 => json!({
                "llmOutput": {
                    "usageMetadata": {"promptTokenCount": prompt, "candidatesTokenCount": completion}
                }
            }),
            _ => json!({"generations": [[{"message": {"usage_metadata": snake}}]]}),
        };
        let (usage, _) = parse_usage_with_source(&envelope);
        prop_assert_eq!(usage.total_tokens, usage.prompt_tokens + usage.completion_tokens);
        prop_assert_eq!(usage.prompt_tokens, prompt);
        prop_assert_eq!(usage.completion_tokens, completion);
    }
}
