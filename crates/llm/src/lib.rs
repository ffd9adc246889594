//! LLM integration crate for Medbot.
//!
//! This crate provides a provider-agnostic abstraction for calling hosted
//! chat models. Every supported provider speaks the OpenAI-compatible
//! chat-completions protocol.
//!
//! # Providers
//! - **Groq**: hosted Llama models (default)
//! - **OpenAI**: any OpenAI-compatible endpoint
//!
//! # Example
//! ```no_run
//! use medbot_llm::{LlmClient, LlmRequest, providers::ChatCompletionsClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ChatCompletionsClient::groq("gsk-...")?;
//! let request = LlmRequest::new("What is acne?", "llama-3.3-70b-versatile");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content.unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::ChatCompletionsClient;
pub use types::ProviderType;
