//! OpenAI-compatible chat completions answerer

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Answerer, DomainError};
use crate::infrastructure::http::HttpClientTrait;

pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai";

/// Answerer calling `/v1/chat/completions` on an OpenAI-compatible API
///
/// The defaults target Groq, which serves the Llama models.
#[derive(Debug)]
pub struct ChatCompletionAnswerer<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    system_prompt: Option<String>,
}

impl<C: HttpClientTrait> ChatCompletionAnswerer<C> {
    pub fn new(client: C, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, model, DEFAULT_GROQ_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let auth_header = format!("Bearer {}", api_key.into());
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            client,
            auth_header,
            base_url,
            model: model.into(),
            temperature: 0.0,
            max_tokens: None,
            system_prompt: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: Option<String>) -> Self {
        self.system_prompt = system_prompt;
        self
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn build_request(&self, question: &str) -> serde_json::Value {
        let mut messages = Vec::with_capacity(2);

        if let Some(ref system) = self.system_prompt {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }

        messages.push(ChatMessage {
            role: "user",
            content: question,
        });

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "stream": false,
        });

        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        body
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<String, DomainError> {
        let response: ChatCompletionResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::generation(format!("Failed to parse chat response: {}", e))
        })?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| DomainError::generation("No choices in response"))?;

        if content.trim().is_empty() {
            return Err(DomainError::generation("Model returned an empty answer"));
        }

        Ok(content)
    }
}

#[async_trait]
impl<C: HttpClientTrait> Answerer for ChatCompletionAnswerer<C> {
    async fn generate(&self, question: &str) -> Result<String, DomainError> {
        let url = self.chat_completions_url();
        let body = self.build_request(question);

        let response = self
            .client
            .post_json(&url, self.headers(), &body)
            .await
            .map_err(|e| DomainError::generation(e.to_string()))?;

        self.parse_response(response)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// Chat completions API types

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http::MockHttpClient;

    const TEST_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

    fn completion(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "model": "llama3-8b-8192",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 12, "completion_tokens": 4, "total_tokens": 16 }
        })
    }

    #[tokio::test]
    async fn test_generate_returns_content() {
        let client = MockHttpClient::new().with_response(TEST_URL, completion("There are five oceans."));
        let answerer = ChatCompletionAnswerer::new(client, "gsk-test", "llama3-8b-8192");

        let answer = answerer.generate("How many oceans are there?").await.unwrap();

        assert_eq!(answer, "There are five oceans.");
    }

    #[tokio::test]
    async fn test_request_body() {
        let client = MockHttpClient::new().with_response(TEST_URL, completion("Tokyo."));
        let answerer = ChatCompletionAnswerer::new(client, "gsk-test", "llama3-8b-8192")
            .with_system_prompt(Some("Answer briefly.".to_string()))
            .with_max_tokens(Some(256));

        answerer.generate("Capital of Japan?").await.unwrap();

        let bodies = answerer.client.requests_to(TEST_URL);
        let body = &bodies[0];
        assert_eq!(body["model"], "llama3-8b-8192");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["stream"], false);
        assert_eq!(body["max_tokens"], 256);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Capital of Japan?");
    }

    #[tokio::test]
    async fn test_transport_error_is_generation_error() {
        let client = MockHttpClient::new().with_error(TEST_URL, "HTTP 429: rate limited");
        let answerer = ChatCompletionAnswerer::new(client, "gsk-test", "llama3-8b-8192");

        let result = answerer.generate("Hello?").await;

        assert!(matches!(result, Err(DomainError::Generation { .. })));
    }

    #[tokio::test]
    async fn test_no_choices_is_generation_error() {
        let client = MockHttpClient::new().with_response(TEST_URL, serde_json::json!({"choices": []}));
        let answerer = ChatCompletionAnswerer::new(client, "gsk-test", "llama3-8b-8192");

        assert!(matches!(
            answerer.generate("Hello?").await,
            Err(DomainError::Generation { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_content_is_generation_error() {
        let client = MockHttpClient::new().with_response(TEST_URL, completion("  "));
        let answerer = ChatCompletionAnswerer::new(client, "gsk-test", "llama3-8b-8192");

        assert!(answerer.generate("Hello?").await.is_err());
    }

    #[tokio::test]
    async fn test_custom_base_url() {
        let url = "http://localhost:11434/v1/chat/completions";
        let client = MockHttpClient::new().with_response(url, completion("Hi"));
        let answerer =
            ChatCompletionAnswerer::with_base_url(client, "key", "llama3", "http://localhost:11434/");

        assert_eq!(answerer.generate("Hello?").await.unwrap(), "Hi");
        assert_eq!(answerer.model(), "llama3");
    }
}
