use std::time::Duration;

use serde::Deserialize;

use crate::domain::{DomainError, SemanticCacheConfig, SimilarityMetric};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub cache: SemanticCacheConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allow any origin, method and header
    #[serde(default = "default_true")]
    pub cors_permissive: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub tracing: TracingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// OpenTelemetry span export over OTLP/gRPC
#[derive(Debug, Clone, Deserialize)]
pub struct TracingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_otlp_endpoint")]
    pub otlp_endpoint: String,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// Fraction of asks traced, 0.0 to 1.0
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
}

/// Prometheus scrape endpoint for the ask and HTTP metrics
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// OpenAI-compatible `/v1/embeddings` endpoint
    #[default]
    OpenAi,
    /// Local all-MiniLM-L6-v2 (requires the `fastembed` feature)
    FastEmbed,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProviderKind,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible chat completions base URL
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IndexProviderKind {
    #[default]
    Pinecone,
    /// Process-local index, lost on restart
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndexConfig {
    #[serde(default)]
    pub provider: IndexProviderKind,
    #[serde(default = "default_index_name")]
    pub name: String,
    #[serde(default)]
    pub metric: SimilarityMetric,
    #[serde(default = "default_cloud")]
    pub cloud: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Data-plane host; looked up from the control plane when unset
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default = "default_control_plane_url")]
    pub control_plane_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_otlp_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_service_name() -> String {
    env!("CARGO_PKG_NAME").to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_dimensions() -> usize {
    384
}

fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_llm_base_url() -> String {
    "https://api.groq.com/openai".to_string()
}

fn default_llm_model() -> String {
    "llama3-8b-8192".to_string()
}

fn default_index_name() -> String {
    "semantic-cache-qa".to_string()
}

fn default_cloud() -> String {
    "aws".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_control_plane_url() -> String {
    "https://api.pinecone.io".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_permissive: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            otlp_endpoint: default_otlp_endpoint(),
            service_name: default_service_name(),
            sampling_ratio: default_sampling_ratio(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_metrics_path(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::default(),
            model: default_embedding_model(),
            dimensions: default_dimensions(),
            base_url: default_openai_base_url(),
            api_key: None,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            temperature: 0.0,
            max_tokens: None,
            system_prompt: None,
            api_key: None,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            provider: IndexProviderKind::default(),
            name: default_index_name(),
            metric: SimilarityMetric::default(),
            cloud: default_cloud(),
            region: default_region(),
            host: None,
            control_plane_url: default_control_plane_url(),
            api_key: None,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AppConfig {
    /// Load from `config/default`, `config/local` and `APP__*` variables
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut app_config: Self = config.try_deserialize()?;
        app_config.apply_key_fallbacks(|name| std::env::var(name).ok());

        Ok(app_config)
    }

    /// Fill unset API keys from the providers' conventional variables
    pub fn apply_key_fallbacks(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.embedding.api_key.is_none() {
            self.embedding.api_key = lookup("OPENAI_API_KEY");
        }

        if self.llm.api_key.is_none() {
            self.llm.api_key = lookup("GROQ_API_KEY");
        }

        if self.index.api_key.is_none() {
            self.index.api_key = lookup("PINECONE_API_KEY");
        }
    }

    /// Check the configuration once at startup
    pub fn validate(&self) -> Result<(), DomainError> {
        self.cache.validate()?;
        self.validate_embedding()?;
        self.validate_llm()?;
        self.validate_index()?;
        self.validate_observability()?;

        if self.http.timeout_secs == 0 {
            return Err(DomainError::configuration("http.timeout_secs must be positive"));
        }

        Ok(())
    }

    fn validate_embedding(&self) -> Result<(), DomainError> {
        let embedding = &self.embedding;

        if embedding.dimensions == 0 {
            return Err(DomainError::configuration("embedding.dimensions must be positive"));
        }

        match embedding.provider {
            EmbeddingProviderKind::OpenAi => {
                if embedding.model.trim().is_empty() {
                    return Err(DomainError::configuration("embedding.model cannot be empty"));
                }

                require_key(&embedding.api_key, "embedding.api_key (or OPENAI_API_KEY)")
            }
            EmbeddingProviderKind::FastEmbed => {
                if !cfg!(feature = "fastembed") {
                    return Err(DomainError::configuration(
                        "embedding.provider = fastembed requires building with --features fastembed",
                    ));
                }

                if embedding.dimensions != 384 {
                    return Err(DomainError::configuration(format!(
                        "all-MiniLM-L6-v2 produces 384 dimensions, embedding.dimensions is {}",
                        embedding.dimensions
                    )));
                }

                Ok(())
            }
        }
    }

    fn validate_llm(&self) -> Result<(), DomainError> {
        if self.llm.model.trim().is_empty() {
            return Err(DomainError::configuration("llm.model cannot be empty"));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(DomainError::configuration(format!(
                "llm.temperature must be within 0.0..=2.0, got {}",
                self.llm.temperature
            )));
        }

        require_key(&self.llm.api_key, "llm.api_key (or GROQ_API_KEY)")
    }

    fn validate_index(&self) -> Result<(), DomainError> {
        if self.index.name.trim().is_empty() {
            return Err(DomainError::configuration("index.name cannot be empty"));
        }

        match self.index.provider {
            IndexProviderKind::Pinecone => {
                require_key(&self.index.api_key, "index.api_key (or PINECONE_API_KEY)")
            }
            IndexProviderKind::Memory => Ok(()),
        }
    }

    fn validate_observability(&self) -> Result<(), DomainError> {
        let tracing = &self.observability.tracing;
        if !(0.0..=1.0).contains(&tracing.sampling_ratio) {
            return Err(DomainError::configuration(format!(
                "observability.tracing.sampling_ratio must be within 0.0..=1.0, got {}",
                tracing.sampling_ratio
            )));
        }

        let metrics = &self.observability.metrics;
        // Mounted next to /ask and the health routes
        let shadows_route = RESERVED_PATHS.contains(&metrics.path.as_str());
        if metrics.enabled && (!metrics.path.starts_with('/') || shadows_route) {
            return Err(DomainError::configuration(format!(
                "observability.metrics.path '{}' must start with '/' and not shadow an API route",
                metrics.path
            )));
        }

        Ok(())
    }
}

const RESERVED_PATHS: [&str; 5] = ["/", "/ask", "/health", "/live", "/ready"];

fn require_key(key: &Option<String>, name: &str) -> Result<(), DomainError> {
    match key {
        Some(key) if !key.trim().is_empty() => Ok(()),
        _ => Err(DomainError::configuration(format!("{} is required", name))),
    }
}
