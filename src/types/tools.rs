//! Tool calling and function definition types

use serde::{Deserialize, Serialize};

/// Tool definition for function calling.
///
/// A `ToolSet` is simply `Vec<Tool>`; order is significant and preserved by every
/// conversion in this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Tool {
    /// User-defined function tool
    Function {
        #[serde(flatten)]
        function: ToolFunction,
    },
}

impl Tool {
    /// Create a new function tool
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self::Function {
            function: ToolFunction {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }

    /// Tool name as the model sees it
    pub fn name(&self) -> &str {
        match self {
            Self::Function { function } => &function.name,
        }
    }

    /// Function definition, if this is a function tool
    pub fn as_function(&self) -> Option<&ToolFunction> {
        match self {
            Self::Function { function } => Some(function),
        }
    }
}

/// Tool function definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolFunction {
    /// Function name
    pub name: String,
    /// Function description
    #[serde(default)]
    pub description: String,
    /// JSON schema for function parameters
    #[serde(default)]
    pub parameters: serde_json::Value,
}

/// How the model should pick among the bound tools.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolChoice {
    /// Model decides whether to call a tool
    #[default]
    Auto,
    /// Model must call at least one tool
    Required,
    /// Model must not call tools
    None,
    /// Model must call the named tool
    Tool { name: String },
}

impl ToolChoice {
    /// Force a specific tool by name
    pub fn tool(name: impl Into<String>) -> Self {
        Self::Tool { name: name.into() }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Arguments as parsed JSON
    #[serde(default)]
    pub arguments: serde_json::Value,
}
