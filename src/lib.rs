//! Semantic Cache QA
//!
//! Answers natural-language questions, reusing stored answers for
//! semantically similar earlier questions:
//! - Embeddings from an OpenAI-compatible endpoint or a local MiniLM model
//! - Nearest-neighbour lookup in Pinecone or an in-memory index
//! - Answers generated through an OpenAI-compatible chat completions API

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use tracing::info;

use domain::DomainError;
use infrastructure::{
    embedding::create_embedder, http::HttpClient, llm::create_answerer,
    services::SemanticCacheService, vector_index::create_vector_index,
};

/// Build the service and its collaborators from configuration
pub fn build_service(config: &AppConfig) -> Result<SemanticCacheService, DomainError> {
    let client = HttpClient::with_timeout(config.http.timeout())?;

    let embedder = create_embedder(&config.embedding, client.clone())?;
    let index = create_vector_index(&config.index, client.clone())?;
    let answerer = create_answerer(&config.llm, client)?;

    info!(
        embedder = embedder.name(),
        dimensions = embedder.dimensions(),
        index = %config.index.name,
        model = answerer.model(),
        threshold = config.cache.similarity_threshold,
        "Semantic cache configured"
    );

    Ok(SemanticCacheService::with_config(
        embedder,
        index,
        answerer,
        config.cache.clone(),
    ))
}

/// Build the service and make sure its index collection exists
pub async fn create_initialized_service(
    config: &AppConfig,
) -> Result<SemanticCacheService, DomainError> {
    let service = build_service(config)?;
    service.initialize(config.index.metric).await?;

    Ok(service)
}
