//! Embedding provider implementations.

pub mod huggingface;
pub mod mock;
pub mod ollama;

pub use huggingface::HuggingFaceProvider;
pub use mock::MockProvider;
pub use ollama::OllamaProvider;
