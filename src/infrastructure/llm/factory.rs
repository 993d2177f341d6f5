//! Builds the configured answerer

use std::sync::Arc;

use crate::config::LlmConfig;
use crate::domain::{Answerer, DomainError};
use crate::infrastructure::http::HttpClient;

use super::ChatCompletionAnswerer;

/// Create the chat completions answerer from `llm` settings
pub fn create_answerer(
    config: &LlmConfig,
    client: HttpClient,
) -> Result<Arc<dyn Answerer>, DomainError> {
    let api_key = config
        .api_key
        .clone()
        .ok_or_else(|| DomainError::configuration("LLM API key is not set"))?;

    let answerer = ChatCompletionAnswerer::with_base_url(
        client,
        api_key,
        config.model.clone(),
        config.base_url.clone(),
    )
    .with_temperature(config.temperature)
    .with_max_tokens(config.max_tokens)
    .with_system_prompt(config.system_prompt.clone());

    Ok(Arc::new(answerer))
}
