//! Embedding providers.
//!
//! Maps text to fixed-length vectors. The model and endpoint are
//! configuration; every provider checks the returned dimension against the
//! configured one.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};
