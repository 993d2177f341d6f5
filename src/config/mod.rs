//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, EmbeddingConfig, EmbeddingProviderKind, HttpConfig, IndexConfig,
    IndexProviderKind, LlmConfig, LogFormat, LoggingConfig, MetricsConfig, ObservabilityConfig,
    ServerConfig, TracingConfig,
};
