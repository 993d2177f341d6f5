//! Pinecone serverless index adapter

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::domain::embedding::Embedding;
use crate::domain::semantic_cache::{
    format_timestamp, sort_matches, CacheEntry, EntryId, IndexMatch, SimilarityMetric, VectorIndex,
};
use crate::domain::DomainError;
use crate::infrastructure::http::HttpClientTrait;

pub const DEFAULT_PINECONE_CONTROL_PLANE_URL: &str = "https://api.pinecone.io";
const API_VERSION: &str = "2024-07";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const DEFAULT_MAX_POLLS: usize = 60;

const METADATA_QUESTION: &str = "question";
const METADATA_ANSWER: &str = "answer";
const METADATA_TIMESTAMP: &str = "timestamp";

/// Index description returned by the control plane
#[derive(Debug, Deserialize)]
struct IndexDescription {
    dimension: usize,
    metric: SimilarityMetric,
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    status: IndexStatus,
}

#[derive(Debug, Default, Deserialize)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    id: String,
    score: f32,
    #[serde(default)]
    values: Vec<f32>,
    #[serde(default)]
    metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexStats {
    #[serde(default)]
    dimension: Option<usize>,
    #[serde(default)]
    total_vector_count: usize,
}

/// Vector index stored in a Pinecone serverless index
///
/// The data-plane host is either configured up front or resolved from the
/// control plane by [`VectorIndex::ensure_collection`].
#[derive(Debug)]
pub struct PineconeIndex<C: HttpClientTrait> {
    client: C,
    api_key: String,
    name: String,
    cloud: String,
    region: String,
    control_plane_url: String,
    host: OnceLock<String>,
    dimension: OnceLock<usize>,
    poll_interval: Duration,
    max_polls: usize,
}

impl<C: HttpClientTrait> PineconeIndex<C> {
    pub fn new(
        client: C,
        api_key: impl Into<String>,
        name: impl Into<String>,
        cloud: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            name: name.into(),
            cloud: cloud.into(),
            region: region.into(),
            control_plane_url: DEFAULT_PINECONE_CONTROL_PLANE_URL.to_string(),
            host: OnceLock::new(),
            dimension: OnceLock::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: DEFAULT_MAX_POLLS,
        }
    }

    pub fn with_control_plane_url(mut self, url: impl Into<String>) -> Self {
        self.control_plane_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use a known data-plane host instead of looking it up
    pub fn with_host(self, host: impl Into<String>) -> Self {
        let _ = self.host.set(data_plane_url(&host.into()));
        self
    }

    pub fn with_polling(mut self, interval: Duration, max_polls: usize) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls.max(1);
        self
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Api-Key", self.api_key.as_str()),
            ("X-Pinecone-API-Version", API_VERSION),
        ]
    }

    fn indexes_url(&self) -> String {
        format!("{}/indexes", self.control_plane_url)
    }

    fn index_url(&self) -> String {
        format!("{}/indexes/{}", self.control_plane_url, self.name)
    }

    fn base_url(&self) -> Result<&str, DomainError> {
        self.host.get().map(String::as_str).ok_or_else(|| {
            DomainError::configuration(format!("Host of index '{}' is not known yet", self.name))
        })
    }

    async fn describe(&self) -> Result<Option<IndexDescription>, DomainError> {
        let response = self.client.get_json(&self.index_url(), self.headers()).await?;

        response
            .map(|value| {
                serde_json::from_value(value).map_err(|e| {
                    DomainError::provider("pinecone", format!("Invalid index description: {}", e))
                })
            })
            .transpose()
    }

    async fn create(&self, dimension: usize, metric: SimilarityMetric) -> Result<(), DomainError> {
        let body = json!({
            "name": self.name,
            "dimension": dimension,
            "metric": metric.as_str(),
            "spec": {
                "serverless": {
                    "cloud": self.cloud,
                    "region": self.region,
                }
            }
        });

        info!(index = %self.name, dimension, metric = %metric, "Creating index");

        match self.client.post_json(&self.indexes_url(), self.headers(), &body).await {
            Ok(_) => Ok(()),
            // Another process may have created it concurrently
            Err(e) => match self.describe().await? {
                Some(_) => {
                    debug!(index = %self.name, error = %e, "Index appeared during creation");
                    Ok(())
                }
                None => Err(e),
            },
        }
    }

    async fn wait_until_ready(&self) -> Result<String, DomainError> {
        for attempt in 1..=self.max_polls {
            if let Some(description) = self.describe().await? {
                if let Some(host) = ready_host(&description) {
                    return Ok(host);
                }
            }

            debug!(index = %self.name, attempt, "Index not ready yet");
            tokio::time::sleep(self.poll_interval).await;
        }

        Err(DomainError::configuration(format!(
            "Index '{}' did not become ready after {} checks",
            self.name, self.max_polls
        )))
    }

    async fn stats(&self) -> Result<IndexStats, DomainError> {
        let base_url = self.base_url()?;

        let response = self
            .client
            .post_json(
                &format!("{}/describe_index_stats", base_url),
                self.headers(),
                &json!({}),
            )
            .await?;

        serde_json::from_value(response).map_err(|e| {
            DomainError::provider("pinecone", format!("Invalid index stats: {}", e))
        })
    }

    fn check_dimension(&self, actual: usize) -> Result<(), String> {
        match self.dimension.get() {
            Some(&expected) if expected != actual => Err(format!(
                "Vector has {} dimensions, index '{}' has {}",
                actual, self.name, expected
            )),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl<C: HttpClientTrait> VectorIndex for PineconeIndex<C> {
    async fn ensure_collection(
        &self,
        dimension: usize,
        metric: SimilarityMetric,
    ) -> Result<(), DomainError> {
        if self.host.get().is_some() {
            debug!(index = %self.name, "Using configured index host");
            match self.stats().await?.dimension {
                Some(actual) if actual != dimension => {
                    return Err(DomainError::configuration(format!(
                        "Index '{}' has dimension {}, embedder produces {}",
                        self.name, actual, dimension
                    )));
                }
                _ => {}
            }

            let _ = self.dimension.set(dimension);
            return Ok(());
        }

        let host = match self.describe().await? {
            Some(description) => {
                if description.dimension != dimension {
                    return Err(DomainError::configuration(format!(
                        "Index '{}' has dimension {}, embedder produces {}",
                        self.name, description.dimension, dimension
                    )));
                }

                if description.metric != metric {
                    return Err(DomainError::configuration(format!(
                        "Index '{}' uses metric {}, configured {}",
                        self.name, description.metric, metric
                    )));
                }

                match ready_host(&description) {
                    Some(host) => host,
                    None => self.wait_until_ready().await?,
                }
            }
            None => {
                self.create(dimension, metric).await?;
                self.wait_until_ready().await?
            }
        };

        info!(index = %self.name, host = %host, "Index ready");
        let _ = self.host.set(data_plane_url(&host));
        let _ = self.dimension.set(dimension);

        Ok(())
    }

    async fn search(
        &self,
        embedding: &Embedding,
        top_k: usize,
    ) -> Result<Vec<IndexMatch>, DomainError> {
        self.check_dimension(embedding.dimensions())
            .map_err(DomainError::search)?;

        let base_url = self.base_url().map_err(|e| DomainError::search(e.to_string()))?;
        let body = json!({
            "vector": embedding.values(),
            "topK": top_k,
            "includeMetadata": true,
            "includeValues": true,
        });

        let response = self
            .client
            .post_json(&format!("{}/query", base_url), self.headers(), &body)
            .await
            .map_err(|e| DomainError::search(e.to_string()))?;

        let response: QueryResponse = serde_json::from_value(response)
            .map_err(|e| DomainError::search(format!("Invalid query response: {}", e)))?;

        let mut raw = response.matches;
        raw.sort_by(|a, b| b.score.total_cmp(&a.score));

        // The best candidate decides hit or miss, so it must be readable
        let mut matches = Vec::with_capacity(raw.len());
        for (rank, candidate) in raw.into_iter().enumerate() {
            let id = candidate.id.clone();
            match parse_match(candidate) {
                Ok(matched) => matches.push(matched),
                Err(reason) if rank == 0 => {
                    return Err(DomainError::search(format!(
                        "match {} has unusable metadata: {}",
                        id, reason
                    )));
                }
                Err(reason) => {
                    warn!(index = %self.name, reason = %reason, "Skipping unusable match");
                }
            }
        }

        sort_matches(&mut matches);
        matches.truncate(top_k);

        Ok(matches)
    }

    async fn upsert(&self, entry: CacheEntry) -> Result<(), DomainError> {
        self.check_dimension(entry.embedding().dimensions())
            .map_err(DomainError::upsert)?;

        let base_url = self.base_url().map_err(|e| DomainError::upsert(e.to_string()))?;
        let body = json!({
            "vectors": [{
                "id": entry.id().as_str(),
                "values": entry.embedding().values(),
                "metadata": {
                    METADATA_QUESTION: entry.question(),
                    METADATA_ANSWER: entry.answer(),
                    METADATA_TIMESTAMP: format_timestamp(entry.created_at()),
                }
            }]
        });

        self.client
            .post_json(&format!("{}/vectors/upsert", base_url), self.headers(), &body)
            .await
            .map_err(|e| DomainError::upsert(e.to_string()))?;

        Ok(())
    }

    async fn entry_count(&self) -> Result<usize, DomainError> {
        Ok(self.stats().await?.total_vector_count)
    }
}

fn ready_host(description: &IndexDescription) -> Option<String> {
    match &description.host {
        Some(host) if description.status.ready && !host.is_empty() => Some(host.clone()),
        _ => None,
    }
}

/// Hosts come back without a scheme; explicit URLs are kept for local emulators
fn data_plane_url(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

fn parse_match(matched: QueryMatch) -> Result<IndexMatch, String> {
    let metadata = matched
        .metadata
        .ok_or_else(|| format!("match {} has no metadata", matched.id))?;

    let text = |key: &str| {
        metadata
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| format!("match {} has no {}", matched.id, key))
    };

    let question = text(METADATA_QUESTION)?;
    let answer = text(METADATA_ANSWER)?;
    let timestamp = text(METADATA_TIMESTAMP)?;
    let created_at = parse_timestamp(&timestamp)
        .ok_or_else(|| format!("match {} has invalid timestamp '{}'", matched.id, timestamp))?;

    let entry = CacheEntry::from_parts(
        EntryId::from_raw(matched.id),
        Embedding::new(matched.values),
        question,
        answer,
        created_at,
    );

    Ok(IndexMatch::new(entry, matched.score))
}

/// RFC 3339, or a naive ISO 8601 timestamp taken as UTC
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Some(at.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
