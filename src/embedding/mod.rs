//! Text embeddings for catalog resolution and content search.
//!
//! Course titles are embedded at ingestion so partial names can later be
//! resolved against the catalog; transcript chunks and search queries are
//! embedded for the content collection. The trait seam exists so the vector
//! store can be tested with a deterministic fake.

mod openai;

pub use openai::OpenAIEmbedder;

use crate::error::Result;
use async_trait::async_trait;

/// Produces embedding vectors of a fixed dimensionality.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts, returning one vector per input in order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Dimensionality of every vector this embedder produces.
    fn dimensions(&self) -> usize;
}
