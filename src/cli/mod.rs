//! CLI module for Kurs.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Kurs - Course Materials Assistant
///
/// A retrieval-augmented chat backend over indexed course transcripts.
/// The name "Kurs" comes from the Norwegian word for "course."
#[derive(Parser, Debug)]
#[command(name = "kurs")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask a question about the indexed course materials
    Ask {
        /// The question to ask
        question: String,

        /// Session id for conversational follow-ups
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Ingest course documents from a JSON file
    Ingest {
        /// Path to a JSON file with courses and their content chunks
        path: PathBuf,

        /// Re-ingest courses that are already indexed
        #[arg(short, long)]
        force: bool,
    },

    /// List indexed courses
    List,

    /// Start HTTP API server for frontend integration
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}
