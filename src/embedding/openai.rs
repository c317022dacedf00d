//! OpenAI embeddings API implementation.

use super::Embedder;
use crate::config::EmbeddingSettings;
use crate::error::{KursError, Result};
use crate::openai::create_client;
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Most texts the embeddings endpoint accepts per request; ingesting a full
/// course sends its chunks in batches of this size.
const MAX_BATCH: usize = 100;

/// Embedder backed by the OpenAI embeddings API.
pub struct OpenAIEmbedder {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    dimensions: usize,
}

impl OpenAIEmbedder {
    /// Build an embedder from settings, validating them up front so a bad
    /// config fails at startup rather than on the first ingestion.
    pub fn new(settings: &EmbeddingSettings) -> Result<Self> {
        if settings.model.is_empty() {
            return Err(KursError::Config(
                "embedding.model must not be empty".to_string(),
            ));
        }
        if settings.dimensions == 0 {
            return Err(KursError::Config(
                "embedding.dimensions must be positive".to_string(),
            ));
        }

        Ok(Self {
            client: create_client(Duration::from_secs(settings.request_timeout_secs))?,
            model: settings.model.clone(),
            dimensions: settings.dimensions as usize,
        })
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let texts = [text.to_string()];
        self.embed_batch(&texts)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| KursError::Embedding("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(MAX_BATCH) {
            let request = CreateEmbeddingRequestArgs::default()
                .model(&self.model)
                .input(EmbeddingInput::StringArray(batch.to_vec()))
                .dimensions(self.dimensions as u32)
                .build()
                .map_err(|e| KursError::Embedding(e.to_string()))?;

            let response = self
                .client
                .embeddings()
                .create(request)
                .await
                .map_err(|e| KursError::OpenAI(format!("Embedding API error: {}", e)))?;

            if response.data.len() != batch.len() {
                return Err(KursError::Embedding(format!(
                    "Expected {} embeddings, got {}",
                    batch.len(),
                    response.data.len()
                )));
            }

            // Responses carry an index because ordering is not guaranteed
            let mut data = response.data;
            data.sort_by_key(|d| d.index);
            vectors.extend(data.into_iter().map(|d| d.embedding));
        }

        debug!("Embedded {} texts", vectors.len());
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
