//! Embedding vector type and similarity math

use serde::{Deserialize, Serialize};

/// A fixed-dimension embedding vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    /// Create a new embedding from a raw vector
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    /// Get the embedding values
    pub fn values(&self) -> &[f32] {
        &self.0
    }

    /// Get the embedding dimensions
    pub fn dimensions(&self) -> usize {
        self.0.len()
    }

    /// Consume and return the vector
    pub fn into_vec(self) -> Vec<f32> {
        self.0
    }

    /// Calculate cosine similarity with another embedding
    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        cosine_similarity(&self.0, &other.0)
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// Calculate cosine similarity between two vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
