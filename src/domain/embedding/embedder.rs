//! Embedder trait definition

use async_trait::async_trait;
use std::fmt::Debug;

use super::Embedding;
use crate::domain::DomainError;

/// Turns text into a fixed-dimension embedding
///
/// Implementations must be deterministic for identical input and always
/// produce vectors of `dimensions()` length.
#[async_trait]
pub trait Embedder: Send + Sync + Debug {
    /// Generate the embedding for a single text
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError>;

    /// Get the embedder name (for logs)
    fn name(&self) -> &str;

    /// Get the output dimension
    fn dimensions(&self) -> usize;
}
