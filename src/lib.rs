//! # vertex-cache-chat
//!
//! A Vertex AI Gemini chat model connector that can reuse a server-side context
//! cache while staying usable as a tool-calling chat model.
//!
#![deny(unsafe_code)]

//! ## Features
//!
//! - **Capability-preserving cache binding**: [`cache::CachedContentBinder`] wraps any
//!   [`LanguageModel`] so every call carries `cachedContent`, and re-exposes tool
//!   binding, structured output and identity on the wrapper.
//! - **Conflict guard**: attaching tools to a cached model fails with a payload
//!   containing the function declarations to bake into the cache (configurable).
//! - **Usage parsing**: [`usage::parse_usage`] normalises the token accounting shapes
//!   different SDKs emit into one [`Usage`] record.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vertex_cache_chat::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let model = VertexGeminiBuilder::new()
//!         .project("my-project")
//!         .model("gemini-2.5-flash")
//!         .access_token("ya29...")
//!         .cached_content("projects/my-project/locations/us-central1/cachedContents/42")
//!         .build()?;
//!
//!     let response = model.chat(vec![ChatMessage::user("Summarise the cached report")]).await?;
//!     println!("{}", response.text().unwrap_or_default());
//!     println!("{:?}", response.usage());
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod cache;
pub mod error;
pub mod observability;
pub mod providers;
pub mod traits;
pub mod types;
pub mod usage;

pub use error::{ErrorCategory, LlmError};
pub use traits::LanguageModel;
pub use types::Usage;

pub mod prelude {
    pub use crate::auth::{StaticTokenProvider, TokenProvider};
    pub use crate::cache::{
        CacheBoundModel, CacheConflictPolicy, CachedContentBinder, ConflictResolution,
        ToolCacheConflict,
    };
    pub use crate::error::{ErrorCategory, LlmError};
    pub use crate::providers::vertex::{VertexGeminiBuilder, VertexGeminiClient};
    pub use crate::traits::{
        BindToolsOptions, LanguageModel, ModelIdentity, ProviderCapabilities,
        StructuredOutputCapability, ToolBindingCapability, is_tool_calling_chat_model,
    };
    pub use crate::types::{
        CacheReference, CallOptions, ChatMessage, ChatResponse, Tool, ToolCall, ToolChoice,
        Usage,
    };
    pub use crate::usage::parse_usage;
}
