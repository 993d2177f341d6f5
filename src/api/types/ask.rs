//! Request and response bodies of `POST /ask`

use serde::{Deserialize, Serialize};

use crate::domain::{AnswerSource, AskResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

/// Answer with its provenance; `similarity` and `matched_question` are
/// `null` unless the answer came from the cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskResponse {
    pub source: AnswerSource,
    pub answer: String,
    pub similarity: Option<f32>,
    pub matched_question: Option<String>,
    pub timestamp: String,
}

impl From<AskResult> for AskResponse {
    fn from(result: AskResult) -> Self {
        Self {
            source: result.source,
            answer: result.answer,
            similarity: result.similarity,
            matched_question: result.matched_question,
            timestamp: result.timestamp,
        }
    }
}
