//! Answerer trait definition

use async_trait::async_trait;
use std::fmt::Debug;

use crate::domain::DomainError;

/// Produces a free-text answer for a question by invoking a language model
#[async_trait]
pub trait Answerer: Send + Sync + Debug {
    /// Generate an answer, failing with `DomainError::Generation`
    async fn generate(&self, question: &str) -> Result<String, DomainError>;

    /// Get the model identifier (for logs)
    fn model(&self) -> &str;
}
