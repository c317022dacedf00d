//! Error types for Kurs.

use thiserror::Error;

/// Library-level error type for Kurs operations.
#[derive(Error, Debug)]
pub enum KursError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Response generation failed: {0}")]
    Generator(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),
}

/// Result type alias for Kurs operations.
pub type Result<T> = std::result::Result<T, KursError>;
