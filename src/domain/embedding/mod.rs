//! Embedding domain models and traits

mod embedder;
mod vector;

pub use embedder::Embedder;
pub use vector::{cosine_similarity, Embedding};

#[cfg(test)]
pub use embedder::mock::{MockEmbedder, ScriptedEmbedder};
