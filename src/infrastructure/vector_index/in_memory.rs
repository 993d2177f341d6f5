//! In-memory vector index

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::embedding::Embedding;
use crate::domain::semantic_cache::{
    sort_matches, CacheEntry, EntryId, IndexMatch, SimilarityMetric, VectorIndex,
};
use crate::domain::DomainError;

/// Vector index keeping entries in a map and scanning linearly
///
/// Suitable for development, tests and small single-process deployments.
/// Entries are lost when the process exits.
#[derive(Debug, Default)]
pub struct InMemoryVectorIndex {
    entries: RwLock<HashMap<EntryId, CacheEntry>>,
    dimension: RwLock<Option<usize>>,
}

impl InMemoryVectorIndex {
    /// Create an index whose collection is set up by `ensure_collection`
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an index with the collection already set up
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            dimension: RwLock::new(Some(dimension)),
        }
    }

    fn dimension(&self) -> Result<usize, DomainError> {
        self.dimension
            .read()
            .map_err(|e| DomainError::internal(format!("Failed to acquire read lock: {}", e)))?
            .ok_or_else(|| DomainError::configuration("Collection has not been created"))
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn ensure_collection(
        &self,
        dimension: usize,
        metric: SimilarityMetric,
    ) -> Result<(), DomainError> {
        if metric != SimilarityMetric::Cosine {
            return Err(DomainError::configuration(format!(
                "In-memory index only supports cosine similarity, got {}",
                metric
            )));
        }

        let mut current = self.dimension.write().map_err(|e| {
            DomainError::internal(format!("Failed to acquire write lock: {}", e))
        })?;

        match *current {
            Some(existing) if existing != dimension => Err(DomainError::configuration(format!(
                "Collection dimension is {}, requested {}",
                existing, dimension
            ))),
            Some(_) => Ok(()),
            None => {
                *current = Some(dimension);
                Ok(())
            }
        }
    }

    async fn search(
        &self,
        embedding: &Embedding,
        top_k: usize,
    ) -> Result<Vec<IndexMatch>, DomainError> {
        let dimension = self.dimension().map_err(|e| DomainError::search(e.to_string()))?;

        if embedding.dimensions() != dimension {
            return Err(DomainError::search(format!(
                "Query has {} dimensions, collection has {}",
                embedding.dimensions(),
                dimension
            )));
        }

        let entries = self.entries.read().map_err(|e| {
            DomainError::search(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut matches: Vec<IndexMatch> = entries
            .values()
            .map(|entry| {
                let score = embedding.cosine_similarity(entry.embedding());
                IndexMatch::new(entry.clone(), score)
            })
            .collect();

        sort_matches(&mut matches);
        matches.truncate(top_k);

        Ok(matches)
    }

    async fn upsert(&self, entry: CacheEntry) -> Result<(), DomainError> {
        let dimension = self.dimension().map_err(|e| DomainError::upsert(e.to_string()))?;

        if entry.embedding().dimensions() != dimension {
            return Err(DomainError::upsert(format!(
                "Entry has {} dimensions, collection has {}",
                entry.embedding().dimensions(),
                dimension
            )));
        }

        let mut entries = self.entries.write().map_err(|e| {
            DomainError::upsert(format!("Failed to acquire write lock: {}", e))
        })?;

        entries.insert(entry.id().clone(), entry);

        Ok(())
    }

    async fn entry_count(&self) -> Result<usize, DomainError> {
        let entries = self.entries.read().map_err(|e| {
            DomainError::internal(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(entries.len())
    }
}
