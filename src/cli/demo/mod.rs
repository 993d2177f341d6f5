//! Demo command - runs the built-in question sets through the service

use crate::api::types::AskResponse;
use crate::config::AppConfig;
use crate::infrastructure::observability::init_tracing;
use crate::infrastructure::services::SemanticCacheService;

use super::ask::render_response;

/// A named group of questions; later questions paraphrase the first
pub struct QuestionSet {
    pub name: &'static str,
    pub questions: &'static [&'static str],
}

pub const QUESTION_SETS: &[QuestionSet] = &[
    QuestionSet {
        name: "Oceans",
        questions: &[
            "How many oceans are there in the world?",
            "What is the count of oceans on Earth?",
        ],
    },
    QuestionSet {
        name: "Capital",
        questions: &[
            "What is the capital of Japan?",
            "Which city is the capital of Japan?",
        ],
    },
    QuestionSet {
        name: "India President",
        questions: &[
            "Who is the current President of the India?",
            "Who's leading the Indian government right now?",
        ],
    },
    QuestionSet {
        name: "Cache Miss",
        questions: &["What are the symptoms of flu?"],
    },
];

pub async fn run() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging, &config.observability.tracing);
    config.validate()?;

    let service = crate::create_initialized_service(&config).await?;

    for line in run_sets(&service, QUESTION_SETS).await? {
        println!("{}", line);
    }

    Ok(())
}

/// Ask every question in order and collect the printed report
async fn run_sets(
    service: &SemanticCacheService,
    sets: &[QuestionSet],
) -> anyhow::Result<Vec<String>> {
    let rule = "=".repeat(40);
    let mut report = Vec::new();

    for set in sets {
        report.push(rule.clone());
        report.push(format!("Test Set: {}", set.name));
        report.push(rule.clone());

        for question in set.questions {
            let response = AskResponse::from(service.ask(question).await?);

            report.push(format!("Question: {}", question));
            report.push(render_response(&response));
            report.push("-".repeat(40));
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::embedding::MockEmbedder;
    use crate::domain::llm::MockAnswerer;
    use crate::infrastructure::vector_index::InMemoryVectorIndex;

    #[test]
    fn test_question_sets() {
        let names: Vec<&str> = QUESTION_SETS.iter().map(|s| s.name).collect();

        assert_eq!(names, vec!["Oceans", "Capital", "India President", "Cache Miss"]);
        assert_eq!(QUESTION_SETS.iter().map(|s| s.questions.len()).sum::<usize>(), 7);
    }

    #[tokio::test]
    async fn test_run_sets_repeats_hit_from_cache() {
        let service = SemanticCacheService::new(
            Arc::new(MockEmbedder::new(16)),
            Arc::new(InMemoryVectorIndex::with_dimension(16)),
            Arc::new(MockAnswerer::new("A: ")),
        );
        let sets = [QuestionSet {
            name: "Repeat",
            questions: &["What is the capital of Japan?", "What is the capital of Japan?"],
        }];

        let report = run_sets(&service, &sets).await.unwrap();
        let text = report.join("\n");

        assert!(text.contains("Test Set: Repeat"));
        assert!(text.contains("Answer from LLM"));
        assert!(text.contains("Answer from cache (similarity: 1.00)"));
    }
}
