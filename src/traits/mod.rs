//! Core Trait Definitions
//!
//! Capability traits for chat models. Optional capabilities are exposed through
//! `as_*` accessors returning `Option<&dyn Trait>`, so wrappers can forward exactly
//! the set a model supports.

mod capabilities;
mod model;

pub use capabilities::ProviderCapabilities;
pub use model::{
    BindToolsOptions, LanguageModel, ModelIdentity, StructuredOutputCapability,
    ToolBindingCapability, is_tool_calling_chat_model,
};
