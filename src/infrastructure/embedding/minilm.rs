//! Local embeddings with all-MiniLM-L6-v2 via fastembed

use std::sync::{Mutex, OnceLock};
use std::time::Instant;

use async_trait::async_trait;

use crate::domain::embedding::{Embedder, Embedding};
use crate::domain::DomainError;

pub const MINILM_DIMENSIONS: usize = 384;
const MODEL_NAME: &str = "all-MiniLM-L6-v2";

/// The ONNX model is loaded once per process on first use
static EMBEDDING_MODEL: OnceLock<Mutex<fastembed::TextEmbedding>> = OnceLock::new();

/// Embedder running all-MiniLM-L6-v2 in process
#[derive(Debug, Default)]
pub struct FastEmbedEmbedder;

impl FastEmbedEmbedder {
    pub fn new() -> Self {
        Self
    }

    fn get_model() -> Result<&'static Mutex<fastembed::TextEmbedding>, DomainError> {
        if let Some(model) = EMBEDDING_MODEL.get() {
            return Ok(model);
        }

        tracing::info!(model = MODEL_NAME, "Loading embedding model (first use)");
        let start = Instant::now();

        let options = fastembed::InitOptions::new(fastembed::EmbeddingModel::AllMiniLML6V2)
            .with_show_download_progress(false);

        let model = fastembed::TextEmbedding::try_new(options)
            .map_err(|e| DomainError::embedding(format!("Failed to load {}: {}", MODEL_NAME, e)))?;

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            model = MODEL_NAME,
            "Embedding model loaded"
        );

        // Another thread may have won the race; either instance is fine
        let _ = EMBEDDING_MODEL.set(Mutex::new(model));
        EMBEDDING_MODEL
            .get()
            .ok_or_else(|| DomainError::embedding("Embedding model initialization failed"))
    }

    /// Load the model ahead of the first request
    pub async fn warm_up(&self) -> Result<(), DomainError> {
        tokio::task::spawn_blocking(|| Self::get_model().map(|_| ()))
            .await
            .map_err(|e| DomainError::internal(format!("Embedding task failed: {}", e)))?
    }
}

#[async_trait]
impl Embedder for FastEmbedEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        let text = text.to_string();

        let vector = tokio::task::spawn_blocking(move || {
            let mut model = Self::get_model()?
                .lock()
                .map_err(|_| DomainError::embedding("Embedding model lock poisoned"))?;
            let embeddings = model
                .embed(vec![text], None)
                .map_err(|e| DomainError::embedding(e.to_string()))?;

            embeddings
                .into_iter()
                .next()
                .ok_or_else(|| DomainError::embedding("No embedding returned from model"))
        })
        .await
        .map_err(|e| DomainError::internal(format!("Embedding task failed: {}", e)))??;

        if vector.len() != MINILM_DIMENSIONS {
            return Err(DomainError::embedding(format!(
                "{} returned {} dimensions, expected {}",
                MODEL_NAME,
                vector.len(),
                MINILM_DIMENSIONS
            )));
        }

        Ok(Embedding::new(vector))
    }

    fn name(&self) -> &str {
        MODEL_NAME
    }

    fn dimensions(&self) -> usize {
        MINILM_DIMENSIONS
    }
}
