//! Kurs - Course Materials RAG Backend
//!
//! A chat backend for course materials that combines semantic retrieval with
//! LLM tool calling.
//!
//! The name "Kurs" comes from the Norwegian/Scandinavian word for "course."
//!
//! # Overview
//!
//! Kurs allows you to:
//! - Index pre-chunked course transcripts into a vector store
//! - Ask questions answered by an LLM that decides when to search
//! - Get course outlines and content citations alongside every answer
//! - Serve the whole thing over a small HTTP API
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `embedding` - Embedding generation
//! - `vector_store` - Course catalog and content collections
//! - `tools` - Search/outline tools and the tool manager
//! - `generator` - The sequential tool-calling response generator
//! - `session` - Bounded per-session conversation history
//! - `orchestrator` - Composition and the `query` entry point
//!
//! # Example
//!
//! ```rust,no_run
//! use kurs::config::Settings;
//! use kurs::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(&settings)?;
//!
//!     let outcome = orchestrator.query("What is RAG?", None).await?;
//!     println!("{}", outcome.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod generator;
pub mod openai;
pub mod orchestrator;
pub mod session;
pub mod tools;
pub mod vector_store;

pub use error::{KursError, Result};
