//! Cache entry model and stable identifiers

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::embedding::Embedding;

/// Stable identifier of a cache entry, derived from the question text
///
/// The identifier is the lowercase hex SHA-256 of the normalised question
/// (trimmed, whitespace runs collapsed, lowercased), so it is identical
/// across processes and runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    /// Derive the identifier for a question
    pub fn for_question(question: &str) -> Self {
        let digest = Sha256::digest(normalize_question(question).as_bytes());
        Self(hex::encode(digest))
    }

    /// Wrap an identifier read back from an index
    pub fn from_raw(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalise question text before hashing
pub fn normalize_question(question: &str) -> String {
    question
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// A persisted question/answer pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    id: EntryId,
    embedding: Embedding,
    question: String,
    answer: String,
    created_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Create an entry stamped with the current time
    pub fn new(embedding: Embedding, question: impl Into<String>, answer: impl Into<String>) -> Self {
        let question = question.into();

        Self {
            id: EntryId::for_question(&question),
            embedding,
            question,
            answer: answer.into(),
            created_at: Utc::now(),
        }
    }

    /// Rebuild an entry from stored parts
    pub fn from_parts(
        id: EntryId,
        embedding: Embedding,
        question: impl Into<String>,
        answer: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            embedding,
            question: question.into(),
            answer: answer.into(),
            created_at,
        }
    }

    pub fn id(&self) -> &EntryId {
        &self.id
    }

    pub fn embedding(&self) -> &Embedding {
        &self.embedding
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
