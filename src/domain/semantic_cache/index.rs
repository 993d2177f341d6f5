//! Vector index trait and search types

use std::fmt::{self, Debug};

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use super::CacheEntry;
use crate::domain::embedding::Embedding;
use crate::domain::DomainError;

/// Similarity metric the collection is created with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityMetric {
    #[default]
    Cosine,
    Dotproduct,
    Euclidean,
}

impl SimilarityMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Dotproduct => "dotproduct",
            Self::Euclidean => "euclidean",
        }
    }
}

impl fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored entry together with its similarity to the query
#[derive(Debug, Clone)]
pub struct IndexMatch {
    pub entry: CacheEntry,
    /// Similarity score clamped to 0.0..=1.0
    pub score: f32,
}

impl IndexMatch {
    pub fn new(entry: CacheEntry, score: f32) -> Self {
        Self {
            entry,
            score: score.clamp(0.0, 1.0),
        }
    }
}

/// Orders matches by descending score, breaking ties by entry id
pub fn sort_matches(matches: &mut [IndexMatch]) {
    matches.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.entry.id().cmp(b.entry.id()))
    });
}

/// External nearest-neighbour store holding cache entries
#[cfg_attr(test, automock)]
#[async_trait]
pub trait VectorIndex: Send + Sync + Debug {
    /// Create the collection if missing; validate it otherwise
    async fn ensure_collection(
        &self,
        dimension: usize,
        metric: SimilarityMetric,
    ) -> Result<(), DomainError>;

    /// Find at most `top_k` entries, best first
    async fn search(
        &self,
        embedding: &Embedding,
        top_k: usize,
    ) -> Result<Vec<IndexMatch>, DomainError>;

    /// Store an entry, overwriting any entry with the same id
    async fn upsert(&self, entry: CacheEntry) -> Result<(), DomainError>;

    /// Number of stored entries
    async fn entry_count(&self) -> Result<usize, DomainError>;
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::semantic_cache::EntryId;

    fn entry(id: &str) -> CacheEntry {
        CacheEntry::from_parts(
            EntryId::from_raw(id),
            Embedding::new(vec![1.0]),
            "q",
            "a",
            Utc::now(),
        )
    }

    #[test]
    fn test_score_is_clamped() {
        assert_eq!(IndexMatch::new(entry("a"), 1.0000002).score, 1.0);
        assert_eq!(IndexMatch::new(entry("a"), -0.4).score, 0.0);
        assert_eq!(IndexMatch::new(entry("a"), 0.42).score, 0.42);
    }

    #[test]
    fn test_sort_matches_descending_with_id_tiebreak() {
        let mut matches = vec![
            IndexMatch::new(entry("c"), 0.5),
            IndexMatch::new(entry("b"), 0.9),
            IndexMatch::new(entry("a"), 0.5),
        ];

        sort_matches(&mut matches);

        let ids: Vec<&str> = matches.iter().map(|m| m.entry.id().as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_metric_serialization() {
        assert_eq!(
            serde_json::to_string(&SimilarityMetric::Cosine).unwrap(),
            "\"cosine\""
        );
        assert_eq!(SimilarityMetric::Dotproduct.as_str(), "dotproduct");
    }
}
