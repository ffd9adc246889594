//! Shared request context.

use medbot_core::{AppError, AppResult};
use medbot_knowledge::AnswerGenerator;
use std::sync::{Arc, OnceLock};

/// State handed to every handler.
///
/// The answer generator is installed exactly once, after startup indexing
/// finishes. Until then query endpoints report [`AppError::NotReady`].
#[derive(Clone)]
pub struct AppContext {
    inner: Arc<Inner>,
}

struct Inner {
    index_name: String,
    generator: OnceLock<Arc<dyn AnswerGenerator>>,
}

impl AppContext {
    /// Context whose generator is not yet available.
    pub fn new(index_name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                index_name: index_name.into(),
                generator: OnceLock::new(),
            }),
        }
    }

    /// Context that is ready immediately.
    pub fn ready(index_name: impl Into<String>, generator: Arc<dyn AnswerGenerator>) -> Self {
        let context = Self::new(index_name);
        // Freshly created, cannot already be set
        let _ = context.inner.generator.set(generator);
        context
    }

    pub fn index_name(&self) -> &str {
        &self.inner.index_name
    }

    pub fn is_ready(&self) -> bool {
        self.inner.generator.get().is_some()
    }

    /// Install the generator once startup completes.
    pub fn mark_ready(&self, generator: Arc<dyn AnswerGenerator>) -> AppResult<()> {
        self.inner
            .generator
            .set(generator)
            .map_err(|_| AppError::Other("Answer generator already initialized".to_string()))
    }

    /// The installed generator, or [`AppError::NotReady`].
    pub fn generator(&self) -> AppResult<Arc<dyn AnswerGenerator>> {
        self.inner
            .generator
            .get()
            .cloned()
            .ok_or(AppError::NotReady)
    }
}
