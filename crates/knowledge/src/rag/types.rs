//! RAG chain types.

use crate::types::ScoredChunk;
use serde::{Deserialize, Serialize};

/// Answer substituted when the chat model returns no content.
pub const FALLBACK_ANSWER: &str = "Sorry, I don't know the answer.";

/// Separator placed between chunk texts in the prompt context.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Everything one chain invocation produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainOutput {
    /// The question as passed in
    pub input: String,

    /// Chunks placed in the prompt, most similar first
    pub context: Vec<ScoredChunk>,

    /// Model answer, `None` when the response carried no content
    pub answer: Option<String>,
}

impl ChainOutput {
    /// The answer, or [`FALLBACK_ANSWER`].
    pub fn answer_or_fallback(&self) -> String {
        self.answer
            .clone()
            .unwrap_or_else(|| FALLBACK_ANSWER.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_or_fallback() {
        let mut output = ChainOutput {
            input: "q".to_string(),
            context: vec![],
            answer: None,
        };
        assert_eq!(output.answer_or_fallback(), FALLBACK_ANSWER);

        output.answer = Some("Acne is common.".to_string());
        assert_eq!(output.answer_or_fallback(), "Acne is common.");
    }
}
