//! Semantic cache configuration

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

pub const DEFAULT_FALLBACK_ANSWER: &str = "Sorry, I couldn't generate an answer at this time.";

/// Configuration for the ask pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticCacheConfig {
    /// A candidate is a hit only when its score is strictly greater
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Number of neighbours requested from the index
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Answer returned (and never cached) when generation fails
    #[serde(default = "default_fallback_answer")]
    pub fallback_answer: String,
}

fn default_similarity_threshold() -> f32 {
    0.85
}

fn default_top_k() -> usize {
    1
}

fn default_fallback_answer() -> String {
    DEFAULT_FALLBACK_ANSWER.to_string()
}

impl Default for SemanticCacheConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            top_k: default_top_k(),
            fallback_answer: default_fallback_answer(),
        }
    }
}

impl SemanticCacheConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the similarity threshold
    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// Set the number of neighbours to request
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the fallback answer
    pub fn with_fallback_answer(mut self, answer: impl Into<String>) -> Self {
        self.fallback_answer = answer.into();
        self
    }

    /// Check the values once at startup
    pub fn validate(&self) -> Result<(), DomainError> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(DomainError::configuration(format!(
                "similarity_threshold must be within 0.0..=1.0, got {}",
                self.similarity_threshold
            )));
        }

        if self.top_k == 0 {
            return Err(DomainError::configuration("top_k must be at least 1"));
        }

        if self.fallback_answer.trim().is_empty() {
            return Err(DomainError::configuration("fallback_answer cannot be empty"));
        }

        Ok(())
    }

    /// Hit decision: strictly greater than the threshold
    pub fn is_hit(&self, score: f32) -> bool {
        score > self.similarity_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SemanticCacheConfig::default();

        assert!((config.similarity_threshold - 0.85).abs() < f32::EPSILON);
        assert_eq!(config.top_k, 1);
        assert_eq!(config.fallback_answer, DEFAULT_FALLBACK_ANSWER);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = SemanticCacheConfig::new()
            .with_similarity_threshold(0.9)
            .with_top_k(3)
            .with_fallback_answer("try later");

        assert!((config.similarity_threshold - 0.9).abs() < f32::EPSILON);
        assert_eq!(config.top_k, 3);
        assert_eq!(config.fallback_answer, "try later");
    }

    #[test]
    fn test_hit_is_strictly_greater() {
        let config = SemanticCacheConfig::new().with_similarity_threshold(0.85);

        assert!(config.is_hit(0.851));
        assert!(!config.is_hit(0.85));
        assert!(!config.is_hit(0.5));
    }

    #[test]
    fn test_validate_rejects_out_of_range_threshold() {
        assert!(SemanticCacheConfig::new().with_similarity_threshold(1.5).validate().is_err());
        assert!(SemanticCacheConfig::new().with_similarity_threshold(-0.1).validate().is_err());
        assert!(SemanticCacheConfig::new().with_similarity_threshold(f32::NAN).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_top_k() {
        assert!(SemanticCacheConfig::new().with_top_k(0).validate().is_err());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: SemanticCacheConfig =
            serde_json::from_str(r#"{"similarity_threshold": 0.9}"#).unwrap();

        assert!((config.similarity_threshold - 0.9).abs() < f32::EPSILON);
        assert_eq!(config.top_k, 1);
    }
}
