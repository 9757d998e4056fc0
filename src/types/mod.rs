//! Core data types shared by the binder, the usage parser and the Vertex client.

pub mod cache;
pub mod chat;
pub mod tools;
pub mod usage;

pub use cache::{CacheReference, CacheReferenceParts};
pub use chat::{
    AssistantMessage, CallOptions, ChatMessage, ChatResponse, Generation, MessageRole,
};
pub use tools::{Tool, ToolCall, ToolChoice, ToolFunction};
pub use usage::Usage;
