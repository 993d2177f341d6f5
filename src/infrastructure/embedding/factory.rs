//! Builds the configured embedder

use std::sync::Arc;

use crate::config::{EmbeddingConfig, EmbeddingProviderKind};
use crate::domain::{DomainError, Embedder};
use crate::infrastructure::http::HttpClient;

use super::OpenAiEmbedder;

/// Create the embedder selected by `embedding.provider`
pub fn create_embedder(
    config: &EmbeddingConfig,
    client: HttpClient,
) -> Result<Arc<dyn Embedder>, DomainError> {
    match config.provider {
        EmbeddingProviderKind::OpenAi => {
            let api_key = config
                .api_key
                .clone()
                .ok_or_else(|| DomainError::configuration("Embedding API key is not set"))?;

            Ok(Arc::new(OpenAiEmbedder::with_base_url(
                client,
                api_key,
                config.model.clone(),
                config.dimensions,
                config.base_url.clone(),
            )))
        }
        EmbeddingProviderKind::FastEmbed => create_local_embedder(config),
    }
}

#[cfg(feature = "fastembed")]
fn create_local_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>, DomainError> {
    if config.dimensions != super::MINILM_DIMENSIONS {
        return Err(DomainError::configuration(format!(
            "Local embedder produces {} dimensions, configured {}",
            super::MINILM_DIMENSIONS,
            config.dimensions
        )));
    }

    Ok(Arc::new(super::FastEmbedEmbedder::new()))
}

#[cfg(not(feature = "fastembed"))]
fn create_local_embedder(_config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>, DomainError> {
    Err(DomainError::configuration(
        "Local embeddings require building with --features fastembed",
    ))
}
