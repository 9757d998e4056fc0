//! Conversion between the crate's chat types and Vertex Gemini wire types.

use serde_json::{Value, json};

use super::types::{
    Content, FunctionCall, FunctionCallingConfig, FunctionCallingMode, FunctionDeclaration,
    FunctionResponse, GenerateContentResponse, Part, ToolConfig, UsageMetadata,
};
use crate::error::LlmError;
use crate::types::{
    AssistantMessage, ChatMessage, ChatResponse, Generation, MessageRole, Tool, ToolCall,
    ToolChoice, ToolFunction,
};

fn is_empty_object_schema(json_schema: &Value) -> bool {
    let Some(obj) = json_schema.as_object() else {
        return false;
    };
    if obj.get("type").and_then(|v| v.as_str()) != Some("object") {
        return false;
    }
    let has_no_properties = obj
        .get("properties")
        .and_then(|v| v.as_object())
        .is_none_or(|m| m.is_empty());
    has_no_properties && obj.get("additionalProperties").is_none()
}

fn convert_all(values: &[Value]) -> Value {
    Value::Array(
        values
            .iter()
            .map(|v| convert_json_schema_to_openapi_schema(v, false).unwrap_or(Value::Null))
            .collect(),
    )
}

fn type_name(schema: &Value) -> Option<&str> {
    schema.get("type").and_then(|v| v.as_str())
}

/// Convert a JSON Schema (draft 7) into the OpenAPI 3.0 subset Gemini accepts.
///
/// An empty object schema at the root converts to `None` (no parameters).
pub fn convert_json_schema_to_openapi_schema(json_schema: &Value, is_root: bool) -> Option<Value> {
    if json_schema.is_null() {
        return None;
    }

    if is_empty_object_schema(json_schema) {
        if is_root {
            return None;
        }
        let mut out = serde_json::Map::new();
        out.insert("type".to_string(), json!("object"));
        if let Some(desc) = json_schema.get("description").and_then(|v| v.as_str()) {
            out.insert("description".to_string(), json!(desc));
        }
        return Some(Value::Object(out));
    }

    if json_schema.is_boolean() {
        return Some(json!({ "type": "boolean", "properties": {} }));
    }

    let obj = json_schema.as_object()?;
    let mut result = serde_json::Map::new();

    for key in ["description", "required", "format", "enum", "minLength"] {
        if let Some(v) = obj.get(key) {
            result.insert(key.to_string(), v.clone());
        }
    }
    if let Some(const_value) = obj.get("const").filter(|v| !v.is_null()) {
        result.insert("enum".to_string(), json!([const_value]));
    }

    match obj.get("type") {
        Some(Value::String(s)) => {
            result.insert("type".to_string(), json!(s));
        }
        Some(Value::Array(types)) => {
            let names: Vec<&str> = types.iter().filter_map(|t| t.as_str()).collect();
            let non_null: Vec<&str> = names.iter().copied().filter(|t| *t != "null").collect();
            if non_null.is_empty() {
                result.insert("type".to_string(), json!("null"));
            } else {
                result.insert(
                    "anyOf".to_string(),
                    Value::Array(non_null.iter().map(|t| json!({ "type": t })).collect()),
                );
                if names.len() != non_null.len() {
                    result.insert("nullable".to_string(), json!(true));
                }
            }
        }
        _ => {}
    }

    if let Some(props) = obj.get("properties").and_then(|v| v.as_object()) {
        let mapped: serde_json::Map<String, Value> = props
            .iter()
            .filter_map(|(k, v)| {
                convert_json_schema_to_openapi_schema(v, false).map(|c| (k.clone(), c))
            })
            .collect();
        result.insert("properties".to_string(), Value::Object(mapped));
    }

    match obj.get("items") {
        Some(Value::Array(items)) => {
            result.insert("items".to_string(), convert_all(items));
        }
        Some(items) => {
            if let Some(converted) = convert_json_schema_to_openapi_schema(items, false) {
                result.insert("items".to_string(), converted);
            }
        }
        None => {}
    }

    if let Some(all_of) = obj.get("allOf").and_then(|v| v.as_array()) {
        result.insert("allOf".to_string(), convert_all(all_of));
    }

    if let Some(any_of) = obj.get("anyOf").and_then(|v| v.as_array()) {
        let non_null: Vec<Value> = any_of
            .iter()
            .filter(|s| type_name(s) != Some("null"))
            .cloned()
            .collect();
        if non_null.len() == any_of.len() {
            result.insert("anyOf".to_string(), convert_all(any_of));
        } else if let [single] = non_null.as_slice() {
            // `anyOf: [X, {type: null}]` collapses to a nullable X
            result.insert("nullable".to_string(), json!(true));
            if let Some(Value::Object(converted)) =
                convert_json_schema_to_openapi_schema(single, false)
            {
                result.extend(converted);
            }
        } else {
            result.insert("anyOf".to_string(), convert_all(&non_null));
            result.insert("nullable".to_string(), json!(true));
        }
    }

    if let Some(one_of) = obj.get("oneOf").and_then(|v| v.as_array()) {
        result.insert("oneOf".to_string(), convert_all(one_of));
    }

    Some(Value::Object(result))
}

/// Render one function tool in the vendor's declaration schema.
pub fn function_declaration(function: &ToolFunction) -> FunctionDeclaration {
    FunctionDeclaration {
        name: function.name.clone(),
        description: function.description.clone(),
        parameters: convert_json_schema_to_openapi_schema(&function.parameters, true),
    }
}

/// One declaration per tool, in input order.
pub fn function_declarations(tools: &[Tool]) -> Vec<FunctionDeclaration> {
    tools
        .iter()
        .filter_map(Tool::as_function)
        .map(function_declaration)
        .collect()
}

pub fn tool_config(choice: &ToolChoice) -> ToolConfig {
    let (mode, allowed) = match choice {
        ToolChoice::Auto => (FunctionCallingMode::Auto, None),
        ToolChoice::Required => (FunctionCallingMode::Any, None),
        ToolChoice::None => (FunctionCallingMode::None, None),
        ToolChoice::Tool { name } => (FunctionCallingMode::Any, Some(vec![name.clone()])),
    };
    ToolConfig {
        function_calling_config: Some(FunctionCallingConfig {
            mode: Some(mode),
            allowed_function_names: allowed,
        }),
    }
}

fn tool_response_payload(content: &str) -> Value {
    match serde_json::from_str::<Value>(content) {
        Ok(Value::Object(map)) => Value::Object(map),
        Ok(other) => json!({ "content": other }),
        Err(_) => json!({ "content": content }),
    }
}

fn message_parts(message: &ChatMessage) -> Result<Vec<Part>, LlmError> {
    let mut parts = Vec::new();
    match message.role {
        MessageRole::Tool => {
            let name = message.name.clone().ok_or_else(|| {
                LlmError::InvalidInput("tool result message is missing the function name".into())
            })?;
            parts.push(Part::FunctionResponse {
                function_response: FunctionResponse {
                    name,
                    response: tool_response_payload(&message.content),
                },
            });
        }
        _ => {
            if !message.content.is_empty() {
                parts.push(Part::Text {
                    text: message.content.clone(),
                    thought: None,
                });
            }
            for call in &message.tool_calls {
                parts.push(Part::FunctionCall {
                    function_call: FunctionCall {
                        name: call.name.clone(),
                        args: call.arguments.clone(),
                    },
                });
            }
        }
    }
    Ok(parts)
}

fn push_merged(contents: &mut Vec<Content>, role: &str, parts: Vec<Part>) {
    if parts.is_empty() {
        return;
    }
    match contents.last_mut() {
        Some(last) if last.role.as_deref() == Some(role) => last.parts.extend(parts),
        _ => contents.push(Content {
            role: Some(role.to_string()),
            parts,
        }),
    }
}

/// Convert chat messages into `(systemInstruction, contents)`.
///
/// Vertex rejects `systemInstruction` alongside `cachedContent`, so when a cache
/// is in use system text is folded into a leading user turn instead.
pub fn messages_to_contents(
    messages: &[ChatMessage],
    uses_cached_content: bool,
) -> Result<(Option<Content>, Vec<Content>), LlmError> {
    let system_text: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == MessageRole::System && !m.content.is_empty())
        .map(|m| m.content.as_str())
        .collect();

    let mut contents = Vec::new();
    let mut system_instruction = None;
    if !system_text.is_empty() {
        let joined = system_text.join("\n\n");
        if uses_cached_content {
            push_merged(
                &mut contents,
                "user",
                vec![Part::Text {
                    text: joined,
                    thought: None,
                }],
            );
        } else {
            system_instruction = Some(Content::text(None, joined));
        }
    }

    for message in messages.iter().filter(|m| m.role != MessageRole::System) {
        let role = match message.role {
            MessageRole::Assistant => "model",
            _ => "user",
        };
        push_merged(&mut contents, role, message_parts(message)?);
    }

    if contents.is_empty() {
        return Err(LlmError::InvalidInput(
            "at least one non-system message is required".into(),
        ));
    }
    Ok((system_instruction, contents))
}

fn snake_usage(usage: &UsageMetadata) -> Value {
    let mut out = json!({
        "input_tokens": usage.prompt_token_count.unwrap_or(0),
        "output_tokens": usage.candidates_token_count.unwrap_or(0),
        "total_tokens": usage.total_token_count.unwrap_or(0),
    });
    if let Some(cached) = usage.cached_content_token_count.filter(|c| *c > 0) {
        out["input_token_details"] = json!({ "cache_read": cached });
    }
    out
}

/// Convert a vendor response into the crate's envelope.
///
/// Usage is reported twice: the vendor camelCase block under
/// `llmOutput.usageMetadata` and a snake-case block on the generation message.
pub fn response_to_chat(response: GenerateContentResponse) -> Result<ChatResponse, LlmError> {
    let usage_metadata = response.usage_metadata.clone();
    let mut generations = Vec::new();

    for candidate in response.candidates {
        let mut text = String::new();
        let mut tool_calls = Vec::new();
        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            match part {
                Part::Text { thought: Some(true), .. } => {}
                Part::Text { text: t, .. } => text.push_str(&t),
                Part::FunctionCall { function_call } => tool_calls.push(ToolCall {
                    id: format!("call_{}", tool_calls.len()),
                    name: function_call.name,
                    arguments: function_call.args,
                }),
                Part::FunctionResponse { .. } => {}
            }
        }
        generations.push(Generation {
            message: AssistantMessage {
                content: text.clone(),
                tool_calls,
                usage_metadata: usage_metadata.as_ref().map(snake_usage),
            },
            text,
            generation_info: candidate
                .finish_reason
                .map(|reason| json!({ "finishReason": reason })),
        });
    }

    let mut llm_output = serde_json::Map::new();
    if let Some(usage) = &usage_metadata {
        llm_output.insert("usageMetadata".to_string(), serde_json::to_value(usage)?);
    }
    if let Some(version) = response.model_version {
        llm_output.insert("modelVersion".to_string(), json!(version));
    }

    Ok(ChatResponse {
        generations: vec![generations],
        llm_output: (!llm_output.is_empty()).then_some(Value::Object(llm_output)),
    })
}
