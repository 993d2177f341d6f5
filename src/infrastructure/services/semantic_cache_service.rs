//! Question answering with a semantic cache in front of the answerer
//!
//! Every ask embeds the question and looks up its nearest stored neighbour.
//! A neighbour scoring strictly above the threshold answers the question;
//! otherwise the answerer is called and its answer stored for next time.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::domain::semantic_cache::{
    AskResult, CacheEntry, EntryId, SemanticCacheConfig, SimilarityMetric, VectorIndex,
};
use crate::domain::{Answerer, DomainError, Embedder, Embedding};
use crate::infrastructure::observability::{
    record_ask, record_hit_similarity, record_upsert_failure, AskOutcome,
};

/// Semantic cache service shared by the HTTP handlers and CLI commands
#[derive(Debug)]
pub struct SemanticCacheService {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    answerer: Arc<dyn Answerer>,
    config: SemanticCacheConfig,
}

impl SemanticCacheService {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        answerer: Arc<dyn Answerer>,
    ) -> Self {
        Self::with_config(embedder, index, answerer, SemanticCacheConfig::default())
    }

    pub fn with_config(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        answerer: Arc<dyn Answerer>,
        config: SemanticCacheConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            answerer,
            config,
        }
    }

    pub fn config(&self) -> &SemanticCacheConfig {
        &self.config
    }

    /// Create or validate the index collection for the embedder's vectors
    pub async fn initialize(&self, metric: SimilarityMetric) -> Result<(), DomainError> {
        let dimension = self.embedder.dimensions();

        info!(
            embedder = self.embedder.name(),
            dimension,
            metric = %metric,
            answerer = self.answerer.model(),
            "Preparing vector index"
        );

        self.index.ensure_collection(dimension, metric).await
    }

    /// Number of entries currently stored in the index
    pub async fn entry_count(&self) -> Result<usize, DomainError> {
        self.index.entry_count().await
    }

    /// Answer a question from the cache or the answerer
    pub async fn ask(&self, question: &str) -> Result<AskResult, DomainError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(DomainError::validation("Question cannot be empty"));
        }

        let start = Instant::now();
        let question_id = EntryId::for_question(question);

        let embedding = self.embed(question).await?;
        let matches = self.index.search(&embedding, self.config.top_k).await?;

        if let Some(best) = matches.into_iter().next() {
            if self.config.is_hit(best.score) {
                info!(
                    question_id = %question_id,
                    matched_id = %best.entry.id(),
                    similarity = best.score,
                    source = "cache",
                    "Cache hit"
                );

                record_hit_similarity(best.score);
                record_ask(AskOutcome::Hit, start.elapsed());
                return Ok(AskResult::from_match(best));
            }

            debug!(
                question_id = %question_id,
                similarity = best.score,
                threshold = self.config.similarity_threshold,
                "Best candidate below threshold"
            );
        }

        let answer = match self.answerer.generate(question).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(question_id = %question_id, error = %e, "Generation failed, returning fallback");
                record_ask(AskOutcome::Fallback, start.elapsed());
                return Ok(AskResult::generated(self.config.fallback_answer.clone(), Utc::now()));
            }
        };

        let entry = CacheEntry::new(embedding, question, answer.clone());
        let created_at = entry.created_at();

        if let Err(e) = self.index.upsert(entry).await {
            warn!(question_id = %question_id, error = %e, "Failed to store answer in cache");
            record_upsert_failure();
        }

        info!(question_id = %question_id, source = "llm", "Cache miss answered");
        record_ask(AskOutcome::Miss, start.elapsed());

        Ok(AskResult::generated(answer, created_at))
    }

    async fn embed(&self, question: &str) -> Result<Embedding, DomainError> {
        let embedding = self.embedder.embed(question).await.map_err(|e| match e {
            DomainError::Embedding { .. } => e,
            other => DomainError::embedding(other.to_string()),
        })?;

        let expected = self.embedder.dimensions();
        if embedding.dimensions() != expected {
            return Err(DomainError::embedding(format!(
                "Embedder returned {} dimensions, expected {}",
                embedding.dimensions(),
                expected
            )));
        }

        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::{MockEmbedder, ScriptedEmbedder};
    use crate::domain::llm::MockAnswerer;
    use crate::domain::semantic_cache::{AnswerSource, IndexMatch, MockVectorIndex};
    use crate::infrastructure::http::MockHttpClient;
    use crate::infrastructure::vector_index::{InMemoryVectorIndex, PineconeIndex};
    use serde_json::json;
    use tokio::sync::Barrier;

    const OCEANS: &str = "How many oceans are there?";
    const OCEANS_COUNT: &str = "What is the count of oceans on Earth?";
    const FLU: &str = "What are the symptoms of flu?";

    fn scenario_embedder() -> ScriptedEmbedder {
        ScriptedEmbedder::new(3)
            .with_vector(OCEANS, vec![1.0, 0.0, 0.0])
            .with_vector(OCEANS_COUNT, vec![0.91, 0.41461, 0.0])
            .with_vector(FLU, vec![0.30, 0.0, 0.95394])
    }

    struct Fixture {
        service: SemanticCacheService,
        index: Arc<InMemoryVectorIndex>,
        answerer: Arc<MockAnswerer>,
    }

    fn fixture(embedder: impl Embedder + 'static, answerer: MockAnswerer) -> Fixture {
        let index = Arc::new(InMemoryVectorIndex::with_dimension(embedder.dimensions()));
        let answerer = Arc::new(answerer);
        let service = SemanticCacheService::new(Arc::new(embedder), index.clone(), answerer.clone());

        Fixture {
            service,
            index,
            answerer,
        }
    }

    fn stored(question: &str, vector: Vec<f32>) -> CacheEntry {
        CacheEntry::new(Embedding::new(vector), question, "stored answer")
    }

    #[tokio::test]
    async fn test_scenario_hit_and_misses() {
        let f = fixture(scenario_embedder(), MockAnswerer::new("A: "));

        let first = f.service.ask(OCEANS).await.unwrap();
        assert_eq!(first.source, AnswerSource::Llm);
        assert_eq!(first.answer, format!("A: {}", OCEANS));
        assert_eq!(f.index.entry_count().await.unwrap(), 1);

        let second = f.service.ask(OCEANS_COUNT).await.unwrap();
        assert_eq!(second.source, AnswerSource::Cache);
        assert_eq!(second.answer, first.answer);
        assert_eq!(second.matched_question.as_deref(), Some(OCEANS));
        assert!((second.similarity.unwrap() - 0.91).abs() < 1e-3);
        assert_eq!(f.index.entry_count().await.unwrap(), 1);

        let third = f.service.ask(FLU).await.unwrap();
        assert_eq!(third.source, AnswerSource::Llm);
        assert!(third.similarity.is_none());
        assert!(third.matched_question.is_none());
        assert_eq!(f.index.entry_count().await.unwrap(), 2);

        assert_eq!(f.answerer.calls(), 2);
    }

    #[tokio::test]
    async fn test_same_question_twice() {
        let f = fixture(MockEmbedder::new(16), MockAnswerer::new(""));

        let first = f.service.ask("What is the capital of Japan?").await.unwrap();
        let second = f.service.ask("What is the capital of Japan?").await.unwrap();

        assert!(!first.is_cache_hit());
        assert!(second.is_cache_hit());
        assert!((second.similarity.unwrap() - 1.0).abs() < 1e-5);
        assert_eq!(second.timestamp, first.timestamp);
        assert_eq!(f.answerer.calls(), 1);
    }

    #[tokio::test]
    async fn test_miss_on_empty_index_upserts_once() {
        let f = fixture(MockEmbedder::new(8), MockAnswerer::new("answer to "));

        let result = f.service.ask("Who is the President of India?").await.unwrap();

        assert_eq!(result.source, AnswerSource::Llm);
        assert!(result.similarity.is_none());
        assert!(result.matched_question.is_none());
        assert!(result.timestamp.ends_with('Z'));
        assert_eq!(f.index.entry_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_score_at_threshold_is_miss() {
        let mut index = MockVectorIndex::new();
        index.expect_search().returning(|_, _| {
            Ok(vec![IndexMatch::new(stored("close", vec![1.0, 0.0]), 0.85)])
        });
        index.expect_upsert().times(1).returning(|_| Ok(()));

        let answerer = Arc::new(MockAnswerer::new("fresh "));
        let service = SemanticCacheService::new(
            Arc::new(MockEmbedder::new(2)),
            Arc::new(index),
            answerer.clone(),
        );

        let result = service.ask("borderline").await.unwrap();

        assert_eq!(result.source, AnswerSource::Llm);
        assert_eq!(result.answer, "fresh borderline");
        assert_eq!(answerer.calls(), 1);
    }

    #[tokio::test]
    async fn test_score_just_above_threshold_is_hit() {
        let mut index = MockVectorIndex::new();
        index.expect_search().returning(|_, _| {
            Ok(vec![IndexMatch::new(stored("close", vec![1.0, 0.0]), 0.8501)])
        });
        index.expect_upsert().never();

        let answerer = Arc::new(MockAnswerer::new(""));
        let service = SemanticCacheService::new(
            Arc::new(MockEmbedder::new(2)),
            Arc::new(index),
            answerer.clone(),
        );

        let result = service.ask("borderline").await.unwrap();

        assert_eq!(result.source, AnswerSource::Cache);
        assert_eq!(result.answer, "stored answer");
        assert_eq!(answerer.calls(), 0);
    }

    #[tokio::test]
    async fn test_generation_failure_returns_fallback_without_upsert() {
        let f = fixture(MockEmbedder::new(8), MockAnswerer::new("").with_error("rate limited"));

        let result = f.service.ask("What is the capital of Japan?").await.unwrap();

        assert_eq!(result.source, AnswerSource::Llm);
        assert_eq!(result.answer, "Sorry, I couldn't generate an answer at this time.");
        assert_eq!(f.index.entry_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_custom_fallback_answer() {
        let index = Arc::new(InMemoryVectorIndex::with_dimension(4));
        let service = SemanticCacheService::with_config(
            Arc::new(MockEmbedder::new(4)),
            index,
            Arc::new(MockAnswerer::new("").with_error("down")),
            SemanticCacheConfig::new().with_fallback_answer("Try again later."),
        );

        let result = service.ask("anything").await.unwrap();

        assert_eq!(result.answer, "Try again later.");
    }

    #[tokio::test]
    async fn test_search_failure_is_error_and_skips_answerer() {
        let mut index = MockVectorIndex::new();
        index
            .expect_search()
            .returning(|_, _| Err(DomainError::search("index unreachable")));
        index.expect_upsert().never();

        let answerer = Arc::new(MockAnswerer::new(""));
        let service = SemanticCacheService::new(
            Arc::new(MockEmbedder::new(4)),
            Arc::new(index),
            answerer.clone(),
        );

        let result = service.ask("question").await;

        assert!(matches!(result, Err(DomainError::Search { .. })));
        assert_eq!(answerer.calls(), 0);
    }

    #[tokio::test]
    async fn test_upsert_failure_still_returns_answer() {
        let mut index = MockVectorIndex::new();
        index.expect_search().returning(|_, _| Ok(Vec::new()));
        index
            .expect_upsert()
            .times(1)
            .returning(|_| Err(DomainError::upsert("write rejected")));

        let service = SemanticCacheService::new(
            Arc::new(MockEmbedder::new(4)),
            Arc::new(index),
            Arc::new(MockAnswerer::new("generated ")),
        );

        let result = service.ask("question").await.unwrap();

        assert_eq!(result.source, AnswerSource::Llm);
        assert_eq!(result.answer, "generated question");
    }

    #[tokio::test]
    async fn test_wrong_dimension_embedding_skips_search() {
        let mut index = MockVectorIndex::new();
        index.expect_search().never();

        // Reports 4 dimensions but produces 3
        #[derive(Debug)]
        struct Misreporting(MockEmbedder);

        #[async_trait::async_trait]
        impl Embedder for Misreporting {
            async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
                self.0.embed(text).await
            }

            fn name(&self) -> &str {
                "misreporting"
            }

            fn dimensions(&self) -> usize {
                4
            }
        }

        let service = SemanticCacheService::new(
            Arc::new(Misreporting(MockEmbedder::new(3))),
            Arc::new(index),
            Arc::new(MockAnswerer::new("")),
        );

        let result = service.ask("question").await;

        assert!(matches!(result, Err(DomainError::Embedding { .. })));
    }

    #[tokio::test]
    async fn test_embedding_failure_is_error() {
        let f = fixture(MockEmbedder::new(4).with_error("quota"), MockAnswerer::new(""));

        let result = f.service.ask("question").await;

        assert!(matches!(result, Err(DomainError::Embedding { .. })));
        assert_eq!(f.answerer.calls(), 0);
    }

    #[tokio::test]
    async fn test_blank_question_rejected_before_collaborators() {
        let f = fixture(MockEmbedder::new(4), MockAnswerer::new(""));

        let result = f.service.ask("   \n\t").await;

        assert!(matches!(result, Err(DomainError::Validation { .. })));
        assert_eq!(f.answerer.calls(), 0);
    }

    #[tokio::test]
    async fn test_unreadable_best_match_is_search_error() {
        const HOST: &str = "https://qa-abc123.svc.aped-4627.pinecone.io";
        let client = Arc::new(MockHttpClient::new().with_response(
            format!("{}/query", HOST),
            json!({
                "matches": [{
                    "id": "x",
                    "score": 0.99,
                    "values": [1.0, 0.0, 0.0],
                    "metadata": {
                        "question": OCEANS,
                        "answer": "Five",
                        "timestamp": "yesterday"
                    }
                }]
            }),
        ));
        let index = PineconeIndex::new(client.clone(), "pc-key", "qa", "aws", "us-east-1")
            .with_host(HOST);
        let answerer = Arc::new(MockAnswerer::new("gen "));
        let service = SemanticCacheService::new(
            Arc::new(scenario_embedder()),
            Arc::new(index),
            answerer.clone(),
        );

        let result = service.ask(OCEANS).await;

        assert!(matches!(result, Err(DomainError::Search { .. })));
        assert_eq!(answerer.calls(), 0);
        assert!(client.requests_to(&format!("{}/vectors/upsert", HOST)).is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_asks() {
        let questions: Vec<String> = (0..8).map(|i| format!("Question number {}", i)).collect();
        // One axis per question keeps every pair at similarity zero
        let embedder = questions.iter().enumerate().fold(ScriptedEmbedder::new(8), |e, (i, q)| {
            let mut vector = vec![0.0; 8];
            vector[i] = 1.0;
            e.with_vector(q.clone(), vector)
        });
        let f = fixture(embedder, MockAnswerer::new("A: "));

        let results = futures::future::join_all(questions.iter().map(|q| f.service.ask(q))).await;

        for (question, result) in questions.iter().zip(results) {
            let result = result.unwrap();
            assert_eq!(result.source, AnswerSource::Llm);
            assert_eq!(result.answer, format!("A: {}", question));
        }
        assert_eq!(f.index.entry_count().await.unwrap(), 8);
    }

    /// Holds every caller inside `generate` until all of them have arrived,
    /// so concurrent asks all search before any of them upserts.
    #[derive(Debug)]
    struct RendezvousAnswerer {
        barrier: Barrier,
        inner: MockAnswerer,
    }

    impl RendezvousAnswerer {
        fn new(callers: usize) -> Self {
            Self {
                barrier: Barrier::new(callers),
                inner: MockAnswerer::new("A: "),
            }
        }
    }

    #[async_trait::async_trait]
    impl Answerer for RendezvousAnswerer {
        async fn generate(&self, question: &str) -> Result<String, DomainError> {
            self.barrier.wait().await;
            self.inner.generate(question).await
        }

        fn model(&self) -> &str {
            self.inner.model()
        }
    }

    fn rendezvous_service(
        embedder: ScriptedEmbedder,
    ) -> (SemanticCacheService, Arc<InMemoryVectorIndex>) {
        let index = Arc::new(InMemoryVectorIndex::with_dimension(embedder.dimensions()));
        let service = SemanticCacheService::new(
            Arc::new(embedder),
            index.clone(),
            Arc::new(RendezvousAnswerer::new(2)),
        );
        (service, index)
    }

    #[tokio::test]
    async fn test_concurrent_same_question_both_miss_then_hit() {
        let (service, index) = rendezvous_service(scenario_embedder());

        let results = futures::future::join_all([service.ask(OCEANS), service.ask(OCEANS)]).await;

        for result in results {
            let result = result.unwrap();
            assert_eq!(result.source, AnswerSource::Llm);
            assert_eq!(result.answer, format!("A: {}", OCEANS));
        }
        // Same normalised question, same id
        assert_eq!(index.entry_count().await.unwrap(), 1);

        let follow_up = service.ask(OCEANS_COUNT).await.unwrap();
        assert_eq!(follow_up.source, AnswerSource::Cache);
        assert_eq!(follow_up.answer, format!("A: {}", OCEANS));
        assert_eq!(follow_up.matched_question.as_deref(), Some(OCEANS));
    }

    #[tokio::test]
    async fn test_concurrent_near_duplicates_both_stored_then_best_hit() {
        const FIRST: &str = "How many oceans are there on Earth?";
        const SECOND: &str = "How many oceans does Earth have?";
        const LATER: &str = "How many oceans exist on Earth?";
        let embedder = ScriptedEmbedder::new(3)
            .with_vector(FIRST, vec![1.0, 0.0, 0.0])
            .with_vector(SECOND, vec![0.99, 0.14107, 0.0])
            .with_vector(LATER, vec![0.999, 0.04471, 0.0]);
        let (service, index) = rendezvous_service(embedder);

        let results = futures::future::join_all([service.ask(FIRST), service.ask(SECOND)]).await;

        for result in results {
            assert_eq!(result.unwrap().source, AnswerSource::Llm);
        }
        assert_eq!(index.entry_count().await.unwrap(), 2);

        // 0.999 against FIRST, 0.995 against SECOND
        let follow_up = service.ask(LATER).await.unwrap();
        assert_eq!(follow_up.source, AnswerSource::Cache);
        assert_eq!(follow_up.matched_question.as_deref(), Some(FIRST));
        assert_eq!(follow_up.answer, format!("A: {}", FIRST));
        assert!((follow_up.similarity.unwrap() - 0.999).abs() < 1e-3);
    }

    #[tokio::test]
    async fn test_initialize_ensures_collection_with_embedder_dimension() {
        let mut index = MockVectorIndex::new();
        index
            .expect_ensure_collection()
            .withf(|dimension, metric| {
                *dimension == 384 && *metric == SimilarityMetric::Cosine
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let service = SemanticCacheService::new(
            Arc::new(MockEmbedder::new(384)),
            Arc::new(index),
            Arc::new(MockAnswerer::new("")),
        );

        service.initialize(SimilarityMetric::Cosine).await.unwrap();
    }
}
