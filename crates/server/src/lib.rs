//! Medical Chatbot HTTP service.
//!
//! Exposes the retrieval-augmented answer chain from `medbot-knowledge`
//! over a small JSON API.

pub mod api;
pub mod server;

pub use api::{router, AppContext};
