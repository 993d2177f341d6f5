//! Builds the configured vector index

use std::sync::Arc;

use crate::config::{IndexConfig, IndexProviderKind};
use crate::domain::{DomainError, VectorIndex};
use crate::infrastructure::http::HttpClient;

use super::{InMemoryVectorIndex, PineconeIndex};

/// Create the index selected by `index.provider`
pub fn create_vector_index(
    config: &IndexConfig,
    client: HttpClient,
) -> Result<Arc<dyn VectorIndex>, DomainError> {
    match config.provider {
        IndexProviderKind::Memory => Ok(Arc::new(InMemoryVectorIndex::new())),
        IndexProviderKind::Pinecone => {
            let api_key = config
                .api_key
                .clone()
                .ok_or_else(|| DomainError::configuration("Index API key is not set"))?;

            let mut index = PineconeIndex::new(
                client,
                api_key,
                config.name.clone(),
                config.cloud.clone(),
                config.region.clone(),
            )
            .with_control_plane_url(config.control_plane_url.clone());

            if let Some(host) = &config.host {
                index = index.with_host(host.clone());
            }

            Ok(Arc::new(index))
        }
    }
}
