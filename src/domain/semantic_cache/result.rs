//! Ask result returned to callers

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::IndexMatch;

/// Where an answer came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerSource {
    Cache,
    Llm,
}

impl AnswerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Llm => "llm",
        }
    }
}

/// Outcome of a single ask
///
/// `similarity` and `matched_question` are only set for cache hits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskResult {
    pub source: AnswerSource,
    pub answer: String,
    pub similarity: Option<f32>,
    pub matched_question: Option<String>,
    pub timestamp: String,
}

impl AskResult {
    /// Result for a cache hit
    pub fn from_match(matched: IndexMatch) -> Self {
        let timestamp = format_timestamp(matched.entry.created_at());

        Self {
            source: AnswerSource::Cache,
            answer: matched.entry.answer().to_string(),
            similarity: Some(matched.score),
            matched_question: Some(matched.entry.question().to_string()),
            timestamp,
        }
    }

    /// Result for a freshly generated (or fallback) answer
    pub fn generated(answer: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            source: AnswerSource::Llm,
            answer: answer.into(),
            similarity: None,
            matched_question: None,
            timestamp: format_timestamp(at),
        }
    }

    pub fn is_cache_hit(&self) -> bool {
        self.source == AnswerSource::Cache
    }
}

/// RFC 3339 timestamp with millisecond precision
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::domain::embedding::Embedding;
    use crate::domain::semantic_cache::CacheEntry;

    #[test]
    fn test_generated_result_has_no_match_fields() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let result = AskResult::generated("Five.", at);

        assert_eq!(result.source, AnswerSource::Llm);
        assert_eq!(result.similarity, None);
        assert_eq!(result.matched_question, None);
        assert_eq!(result.timestamp, "2024-05-01T12:00:00.000Z");
    }

    #[test]
    fn test_cache_result_uses_entry_fields() {
        let entry = CacheEntry::new(Embedding::new(vec![1.0]), "How many oceans?", "Five.");
        let created = entry.created_at();
        let result = AskResult::from_match(IndexMatch::new(entry, 0.91));

        assert!(result.is_cache_hit());
        assert_eq!(result.answer, "Five.");
        assert_eq!(result.similarity, Some(0.91));
        assert_eq!(result.matched_question.as_deref(), Some("How many oceans?"));
        assert_eq!(result.timestamp, format_timestamp(created));
    }

    #[test]
    fn test_serialized_shape() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let json = serde_json::to_value(AskResult::generated("Five.", at)).unwrap();

        assert_eq!(json["source"], "llm");
        assert_eq!(json["answer"], "Five.");
        assert!(json["similarity"].is_null());
        assert!(json["matched_question"].is_null());
        assert_eq!(json["timestamp"], "2024-05-01T12:00:00.000Z");
    }
}
