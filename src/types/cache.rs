//! Context cache reference

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

lazy_static! {
    static ref CACHED_CONTENT_NAME: Option<Regex> =
        Regex::new(r"^(?:projects/([^/]+)/locations/([^/]+)/)?cachedContents/([^/]+)$").ok();
}

/// Opaque name of a server-side cached-context resource.
///
/// Only non-emptiness is enforced. Whether the cache exists or has expired is
/// the vendor service's concern; the value is passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CacheReference(String);

/// Components of a canonical cache name, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheReferenceParts<'a> {
    pub project: Option<&'a str>,
    pub location: Option<&'a str>,
    pub id: &'a str,
}

impl CacheReference {
    /// Capture a cache reference. Surrounding whitespace is trimmed.
    pub fn new(name: impl Into<String>) -> Result<Self, LlmError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(LlmError::InvalidParameter(
                "cached content reference must not be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// `None` for absent or blank input, which callers treat as "no cache".
    pub fn parse_optional(name: Option<&str>) -> Option<Self> {
        name.and_then(|n| Self::new(n).ok())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split `projects/{p}/locations/{l}/cachedContents/{id}` (or the short
    /// `cachedContents/{id}` form). Other shapes return `None` but remain usable.
    pub fn components(&self) -> Option<CacheReferenceParts<'_>> {
        let caps = CACHED_CONTENT_NAME.as_ref()?.captures(&self.0)?;
        Some(CacheReferenceParts {
            project: caps.get(1).map(|m| m.as_str()),
            location: caps.get(2).map(|m| m.as_str()),
            id: caps.get(3)?.as_str(),
        })
    }
}

impl fmt::Display for CacheReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CacheReference {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CacheReference {
    type Error = LlmError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CacheReference> for String {
    fn from(value: CacheReference) -> Self {
        value.0
    }
}

impl AsRef<str> for CacheReference {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_reference() {
        assert!(CacheReference::new("   ").is_err());
        assert!(CacheReference::parse_optional(Some("")).is_none());
        assert!(CacheReference::parse_optional(None).is_none());
    }

    #[test]
    fn trims_and_splits_canonical_name() {
        let cache = CacheReference::new(" projects/p/locations/l/cachedContents/c1 ").unwrap();
        assert_eq!(cache.as_str(), "projects/p/locations/l/cachedContents/c1");
        let parts = cache.components().unwrap();
        assert_eq!(parts.project, Some("p"));
        assert_eq!(parts.location, Some("l"));
        assert_eq!(parts.id, "c1");
    }

    #[test]
    fn short_and_opaque_forms() {
        let short: CacheReference = "cachedContents/abc".parse().unwrap();
        assert_eq!(short.components().unwrap().id, "abc");
        assert_eq!(short.components().unwrap().project, None);

        let opaque = CacheReference::new("my-cache").unwrap();
        assert!(opaque.components().is_none());
        assert_eq!(opaque.to_string(), "my-cache");
    }
}
