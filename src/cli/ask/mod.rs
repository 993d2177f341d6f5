//! Ask command - answers one question in-process

use clap::Args;

use crate::api::types::AskResponse;
use crate::config::AppConfig;
use crate::domain::AnswerSource;
use crate::infrastructure::observability::init_tracing;

#[derive(Args, Debug)]
pub struct AskArgs {
    /// The question to answer
    pub question: String,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: AskArgs) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging, &config.observability.tracing);
    config.validate()?;

    let service = crate::create_initialized_service(&config).await?;
    let response = AskResponse::from(service.ask(&args.question).await?);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("{}", render_response(&response));
    }

    Ok(())
}

/// Human-readable rendering shared by `ask` and `demo`
pub fn render_response(response: &AskResponse) -> String {
    let mut lines = Vec::new();

    match response.source {
        AnswerSource::Cache => {
            lines.push(format!(
                "Answer from cache (similarity: {:.2})",
                response.similarity.unwrap_or_default()
            ));
            if let Some(matched) = &response.matched_question {
                lines.push(format!("Matched question: {}", matched));
            }
            lines.push(format!("Answer: {}", response.answer));
            lines.push(format!("Originally cached at: {}", response.timestamp));
        }
        AnswerSource::Llm => {
            lines.push("Answer from LLM".to_string());
            lines.push(format!("Answer: {}", response.answer));
            lines.push(format!("Cached at: {}", response.timestamp));
        }
    }

    lines.join("\n")
}
