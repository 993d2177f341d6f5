//! Semantic cache domain models and traits
//!
//! Questions are matched by embedding similarity rather than exact text, so
//! a rephrased question can reuse a previously generated answer.

mod config;
mod entry;
mod index;
mod result;

pub use config::{SemanticCacheConfig, DEFAULT_FALLBACK_ANSWER};
pub use entry::{normalize_question, CacheEntry, EntryId};
pub use index::{sort_matches, IndexMatch, SimilarityMetric, VectorIndex};
pub use result::{format_timestamp, AnswerSource, AskResult};

#[cfg(test)]
pub use index::MockVectorIndex;
