//! Vertex AI Gemini provider
//!
//! Minimal `generateContent` client used as the base model for cache binding.

pub mod builder;
pub mod client;
pub mod config;
pub mod convert;
pub mod types;

pub use builder::VertexGeminiBuilder;
pub use client::VertexGeminiClient;
pub use config::VertexGeminiConfig;
pub use types::{HarmBlockThreshold, HarmCategory, SafetySetting};
