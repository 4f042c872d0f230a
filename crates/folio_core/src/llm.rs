//! Downstream language-model collaborator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A completion request that did not produce text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("language model failure: {reason}")]
pub struct LlmFailure {
    /// Human-readable detail.
    pub reason: String,
}

impl LlmFailure {
    /// Creates a failure.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Completes a query given assembled repository context.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generates a response for `query` grounded in `context`.
    async fn complete(&self, context: &str, query: &str) -> Result<String, LlmFailure>;

    /// Largest context, in characters, the model accepts. `None` means no
    /// ceiling beyond the configured budget.
    fn max_input_chars(&self) -> Option<usize> {
        None
    }
}
