//! Chat command - interactive terminal client for a running server

use clap::Args;
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::api::types::{AskRequest, AskResponse};
use crate::config::{LogFormat, LoggingConfig, TracingConfig};
use crate::domain::{AnswerSource, DomainError};
use crate::infrastructure::http::{HttpClient, HttpClientTrait};
use crate::infrastructure::observability::init_tracing;

const PROMPT: &str = "ask> ";

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Base URL of the server
    #[arg(long, default_value = "http://localhost:8000")]
    pub backend_url: String,
}

/// Response details shown under each answer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseDetails {
    pub source: AnswerSource,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_question: Option<String>,
}

impl From<&AskResponse> for ResponseDetails {
    fn from(response: &AskResponse) -> Self {
        let cached = response.source == AnswerSource::Cache;

        Self {
            source: response.source,
            timestamp: response.timestamp.clone(),
            similarity: response.similarity.filter(|_| cached),
            matched_question: response.matched_question.clone().filter(|_| cached),
        }
    }
}

/// One exchange of the session; failed requests have no details
#[derive(Debug, Clone)]
pub struct TranscriptEntry {
    pub question: String,
    pub answer: String,
    pub details: Option<ResponseDetails>,
}

/// Client for `POST /ask` on a running server
#[derive(Debug)]
pub struct ChatClient<C: HttpClientTrait> {
    client: C,
    ask_url: String,
}

impl<C: HttpClientTrait> ChatClient<C> {
    pub fn new(client: C, backend_url: &str) -> Self {
        Self {
            client,
            ask_url: format!("{}/ask", backend_url.trim_end_matches('/')),
        }
    }

    pub async fn ask(&self, question: &str) -> Result<AskResponse, DomainError> {
        let body = serde_json::to_value(AskRequest {
            question: question.to_string(),
        })
        .map_err(|e| DomainError::internal(e.to_string()))?;

        let response = self.client.post_json(&self.ask_url, Vec::new(), &body).await?;

        serde_json::from_value(response)
            .map_err(|e| DomainError::provider("server", format!("Invalid response: {}", e)))
    }
}

pub async fn run(args: ChatArgs) -> anyhow::Result<()> {
    init_tracing(
        &LoggingConfig {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
        },
        &TracingConfig::default(),
    );

    let client = ChatClient::new(HttpClient::new(), &args.backend_url);
    let mut stdout = tokio::io::stdout();

    stdout
        .write_all(
            format!(
                "Semantic Cache QA ({}). Type /history for the transcript, /quit to exit.\n",
                args.backend_url
            )
            .as_bytes(),
        )
        .await?;

    run_session(&client, BufReader::new(tokio::io::stdin()), &mut stdout).await?;

    Ok(())
}

/// Read questions until EOF or `/quit`, returning the transcript
pub async fn run_session<C, R, W>(
    client: &ChatClient<C>,
    reader: R,
    writer: &mut W,
) -> anyhow::Result<Vec<TranscriptEntry>>
where
    C: HttpClientTrait,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut transcript = Vec::new();
    let mut lines = reader.lines();

    loop {
        writer.write_all(PROMPT.as_bytes()).await?;
        writer.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let output = match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/history" => render_transcript(&transcript),
            question => {
                let entry = match client.ask(question).await {
                    Ok(response) => TranscriptEntry {
                        question: question.to_string(),
                        answer: response.answer.clone(),
                        details: Some(ResponseDetails::from(&response)),
                    },
                    Err(e) => TranscriptEntry {
                        question: question.to_string(),
                        answer: format!("Error: {}", e),
                        details: None,
                    },
                };

                let rendered = render_entry(&entry);
                transcript.push(entry);
                rendered
            }
        };

        writer.write_all(output.as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }

    writer.flush().await?;

    Ok(transcript)
}

fn render_entry(entry: &TranscriptEntry) -> String {
    let mut out = entry.answer.clone();

    if let Some(details) = &entry.details {
        let details = serde_json::to_string_pretty(details).unwrap_or_default();
        out.push_str("\nDetails: ");
        out.push_str(&details);
    }

    out
}

fn render_transcript(transcript: &[TranscriptEntry]) -> String {
    if transcript.is_empty() {
        return "(no questions yet)".to_string();
    }

    transcript
        .iter()
        .enumerate()
        .map(|(i, entry)| format!("[{}] Q: {}\n{}", i + 1, entry.question, render_entry(entry)))
        .collect::<Vec<_>>()
        .join("\n")
}
