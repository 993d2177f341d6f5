//! Domain layer - core types and collaborator traits

pub mod embedding;
pub mod error;
pub mod llm;
pub mod semantic_cache;

pub use embedding::{Embedder, Embedding};
pub use error::DomainError;
pub use llm::Answerer;
pub use semantic_cache::{
    AnswerSource, AskResult, CacheEntry, EntryId, IndexMatch, SemanticCacheConfig,
    SimilarityMetric, VectorIndex,
};
