//! Prompt system for the Medbot service.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions with system and human templates
//! - A built-in medical question-answering prompt
//! - Handlebars template rendering

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{default_prompt, load_or_default, load_prompt, DEFAULT_PROMPT_ID};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
