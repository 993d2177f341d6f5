//! Application state for shared services

use std::sync::Arc;

use crate::domain::{AskResult, DomainError};
use crate::infrastructure::services::SemanticCacheService;

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub cache_service: Arc<dyn SemanticCacheServiceTrait>,
}

impl AppState {
    pub fn new(cache_service: Arc<dyn SemanticCacheServiceTrait>) -> Self {
        Self { cache_service }
    }
}

/// Trait for semantic cache operations
#[async_trait::async_trait]
pub trait SemanticCacheServiceTrait: Send + Sync {
    async fn ask(&self, question: &str) -> Result<AskResult, DomainError>;
    async fn entry_count(&self) -> Result<usize, DomainError>;
}

#[async_trait::async_trait]
impl SemanticCacheServiceTrait for SemanticCacheService {
    async fn ask(&self, question: &str) -> Result<AskResult, DomainError> {
        SemanticCacheService::ask(self, question).await
    }

    async fn entry_count(&self) -> Result<usize, DomainError> {
        SemanticCacheService::entry_count(self).await
    }
}
