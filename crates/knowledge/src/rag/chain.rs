//! Retrieval chain: retrieve, render the prompt, ask the chat model.

use super::types::{ChainOutput, CONTEXT_SEPARATOR};
use super::AnswerGenerator;
use crate::retriever::Retriever;
use crate::types::{ConversationTurn, ScoredChunk};
use medbot_core::AppResult;
use medbot_llm::{LlmClient, LlmRequest};
use medbot_prompt::{build_prompt, PromptDefinition};
use std::collections::HashMap;
use std::sync::Arc;

/// Chat model parameters used by the chain.
#[derive(Debug, Clone, PartialEq)]
pub struct RagChainOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl Default for RagChainOptions {
    fn default() -> Self {
        Self {
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.3,
            max_tokens: None,
        }
    }
}

/// Build the prompt context from retrieved chunks.
pub fn build_context(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.document.page_content.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}

/// Immutable retrieval chain shared by all requests.
pub struct RagChain {
    retriever: Retriever,
    llm: Arc<dyn LlmClient>,
    prompt: PromptDefinition,
    options: RagChainOptions,
}

impl RagChain {
    pub fn new(
        retriever: Retriever,
        llm: Arc<dyn LlmClient>,
        prompt: PromptDefinition,
        options: RagChainOptions,
    ) -> Self {
        Self {
            retriever,
            llm,
            prompt,
            options,
        }
    }

    /// Run retrieval and generation for one question.
    ///
    /// Errors from the embedding provider, the index or the chat model are
    /// returned unchanged; nothing is retried.
    pub async fn invoke(&self, input: &str) -> AppResult<ChainOutput> {
        let context = self.retriever.retrieve(input).await?;

        let mut variables = HashMap::new();
        variables.insert("context".to_string(), build_context(&context));
        variables.insert("input".to_string(), input.to_string());
        let built = build_prompt(&self.prompt, variables)?;

        let mut request = LlmRequest::new(built.user, &self.options.model)
            .with_system(built.system)
            .with_temperature(self.options.temperature);
        if let Some(max_tokens) = self.options.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        let response = self.llm.complete(&request).await?;

        tracing::debug!(
            provider = self.llm.provider_name(),
            chunks = context.len(),
            total_tokens = response.usage.total_tokens,
            "Chain invocation finished"
        );

        Ok(ChainOutput {
            input: input.to_string(),
            context,
            answer: response.content,
        })
    }
}

#[async_trait::async_trait]
impl AnswerGenerator for RagChain {
    async fn answer(&self, question: &str) -> AppResult<ConversationTurn> {
        let output = self.invoke(question).await?;
        if output.answer.is_none() {
            tracing::warn!("Chat model returned no content, using fallback answer");
        }

        Ok(ConversationTurn {
            question: question.to_string(),
            answer: output.answer_or_fallback(),
        })
    }
}
