//! Shared construction of OpenAI API clients.
//!
//! Both the chat model and the embedder talk to the API through clients built
//! here; each component passes its own request timeout from `Settings`.

use crate::error::{KursError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Build an API client whose requests abort after `timeout`.
///
/// Credentials come from the environment (`OPENAI_API_KEY`).
pub fn create_client(timeout: Duration) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| KursError::OpenAI(format!("Failed to build HTTP client: {}", e)))?;

    Ok(Client::with_config(OpenAIConfig::default()).with_http_client(http_client))
}
