//! RAG (Retrieval-Augmented Generation) answering.
//!
//! Stuffs retrieved chunk text into the prompt and asks the chat model.

pub mod chain;
pub mod types;

pub use chain::{build_context, RagChain, RagChainOptions};
pub use types::{ChainOutput, CONTEXT_SEPARATOR, FALLBACK_ANSWER};

use crate::types::ConversationTurn;
use medbot_core::AppResult;

/// Anything that can answer a single question.
///
/// The HTTP layer depends on this rather than on [`RagChain`] so handlers
/// can be exercised without remote services.
#[async_trait::async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn answer(&self, question: &str) -> AppResult<ConversationTurn>;
}
