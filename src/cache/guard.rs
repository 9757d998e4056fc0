//! Cache/tools conflict guard and grounding precedence.
//!
//! Vertex rejects a `generateContent` call that carries both `cachedContent` and
//! request-level tools. Tools have to be baked into the cache when it is created,
//! so the default response to a conflict is a loud failure whose payload is the
//! declaration block an operator can paste into the cache-creation request.

use std::fmt;

use serde_json::json;
use tracing::warn;

use crate::error::LlmError;
use crate::providers::vertex::convert::function_declarations;
use crate::providers::vertex::types::FunctionDeclaration;
use crate::types::{CacheReference, Tool};

/// What to do when a feature collides with a context cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictResolution {
    /// Fail the operation
    Reject,
    /// Keep the cache, drop the other feature and warn
    PreferCache,
}

/// Per-feature conflict handling.
///
/// The default rejects tools and lets the cache win over grounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConflictPolicy {
    pub tools: ConflictResolution,
    pub grounding: ConflictResolution,
}

impl Default for CacheConflictPolicy {
    fn default() -> Self {
        Self {
            tools: ConflictResolution::Reject,
            grounding: ConflictResolution::PreferCache,
        }
    }
}

impl CacheConflictPolicy {
    /// Reject every conflict
    pub const fn strict() -> Self {
        Self {
            tools: ConflictResolution::Reject,
            grounding: ConflictResolution::Reject,
        }
    }

    /// Let the cache win every conflict
    pub const fn prefer_cache() -> Self {
        Self {
            tools: ConflictResolution::PreferCache,
            grounding: ConflictResolution::PreferCache,
        }
    }

    pub const fn with_tools(mut self, resolution: ConflictResolution) -> Self {
        self.tools = resolution;
        self
    }

    pub const fn with_grounding(mut self, resolution: ConflictResolution) -> Self {
        self.grounding = resolution;
        self
    }
}

/// Outcome of evaluating a tool set against a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Clear,
    Conflict,
}

/// Diagnostic payload for a rejected tools + cache combination.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCacheConflict {
    pub cache_reference: CacheReference,
    /// One entry per tool, in the order the tools were supplied
    pub function_declarations: Vec<FunctionDeclaration>,
}

impl ToolCacheConflict {
    pub fn new(cache_reference: CacheReference, tools: &[Tool]) -> Self {
        Self {
            cache_reference,
            function_declarations: function_declarations(tools),
        }
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.function_declarations
            .iter()
            .map(|d| d.name.as_str())
            .collect()
    }

    /// `{"tools": [{"functionDeclarations": [...]}]}`, pretty-printed, ready to
    /// paste into a cache-creation request.
    pub fn cache_creation_snippet(&self) -> String {
        let snippet = json!({
            "tools": [{ "functionDeclarations": self.function_declarations }]
        });
        serde_json::to_string_pretty(&snippet).unwrap_or_else(|_| snippet.to_string())
    }
}

impl fmt::Display for ToolCacheConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Cannot bind tools [{}] to a model using cached content '{}': Vertex AI rejects \
             requests that combine cachedContent with tools.",
            self.tool_names().join(", "),
            self.cache_reference
        )?;
        writeln!(
            f,
            "Recreate the cache with these tool declarations included, or remove the cache reference:"
        )?;
        write!(f, "{}", self.cache_creation_snippet())
    }
}

/// Stateless guard evaluated once per tool attachment.
pub struct ToolCacheGuard;

impl ToolCacheGuard {
    pub fn evaluate(tools: &[Tool], cache: Option<&CacheReference>) -> GuardState {
        if !tools.is_empty() && cache.is_some() {
            GuardState::Conflict
        } else {
            GuardState::Clear
        }
    }

    /// Returns the tools that may be attached.
    ///
    /// On conflict, `Reject` fails with [`LlmError::ToolCacheConflict`];
    /// `PreferCache` drops the tools with a warning.
    pub fn check(
        tools: Vec<Tool>,
        cache: Option<&CacheReference>,
        resolution: ConflictResolution,
    ) -> Result<Vec<Tool>, LlmError> {
        let Some(cache) = cache.filter(|_| Self::evaluate(&tools, cache) == GuardState::Conflict)
        else {
            return Ok(tools);
        };
        match resolution {
            ConflictResolution::Reject => Err(LlmError::ToolCacheConflict(Box::new(
                ToolCacheConflict::new(cache.clone(), &tools),
            ))),
            ConflictResolution::PreferCache => {
                let names: Vec<&str> = tools.iter().map(Tool::name).collect();
                warn!(
                    cached_content = %cache,
                    tools = ?names,
                    "Dropping tools: cached content takes precedence"
                );
                Ok(Vec::new())
            }
        }
    }
}

/// Effective grounding flag once a cache is taken into account.
pub fn resolve_grounding(
    grounding_requested: bool,
    cache: Option<&CacheReference>,
    resolution: ConflictResolution,
) -> Result<bool, LlmError> {
    let Some(cache) = cache.filter(|_| grounding_requested) else {
        return Ok(grounding_requested);
    };
    match resolution {
        ConflictResolution::Reject => Err(LlmError::ConfigurationError(format!(
            "search grounding cannot be combined with cached content '{cache}'"
        ))),
        ConflictResolution::PreferCache => {
            warn!(
                cached_content = %cache,
                "Search grounding disabled: cached content takes precedence"
            );
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> CacheReference {
        CacheReference::new("projects/p/locations/l/cachedContents/c1").unwrap()
    }

    fn tool(name: &str) -> Tool {
        Tool::function(
            name,
            format!("{name} tool"),
            serde_json::json!({"type": "object", "properties": {"x": {"type": "string"}}}),
        )
    }

    #[test]
    fn evaluate_states() {
        assert_eq!(ToolCacheGuard::evaluate(&[], Some(&cache())), GuardState::Clear);
        assert_eq!(ToolCacheGuard::evaluate(&[tool("a")], None), GuardState::Clear);
        assert_eq!(
            ToolCacheGuard::evaluate(&[tool("a")], Some(&cache())),
            GuardState::Conflict
        );
    }

    #[test]
    fn prefer_cache_drops_tools() {
        let kept =
            ToolCacheGuard::check(vec![tool("a")], Some(&cache()), ConflictResolution::PreferCache)
                .unwrap();
        assert!(kept.is_empty());
    }

    #[test]
    fn snippet_is_pasteable_json() {
        let conflict = ToolCacheConflict::new(cache(), &[tool("a"), tool("b")]);
        let parsed: serde_json::Value =
            serde_json::from_str(&conflict.cache_creation_snippet()).unwrap();
        let decls = &parsed["tools"][0]["functionDeclarations"];
        assert_eq!(decls[0]["name"], "a");
        assert_eq!(decls[1]["name"], "b");
        assert_eq!(decls[1]["parameters"]["properties"]["x"]["type"], "string");
        assert!(conflict.to_string().contains("[a, b]"));
    }

    #[test]
    fn grounding_resolution() {
        assert!(!resolve_grounding(true, Some(&cache()), ConflictResolution::PreferCache).unwrap());
        assert!(resolve_grounding(true, None, ConflictResolution::Reject).unwrap());
        assert!(!resolve_grounding(false, Some(&cache()), ConflictResolution::Reject).unwrap());
        assert!(resolve_grounding(true, Some(&cache()), ConflictResolution::Reject).is_err());
    }
}
