//! Kurs CLI entry point.

use anyhow::Result;
use clap::Parser;
use kurs::cli::{commands, Cli, Commands, Output};
use kurs::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("kurs={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(e) = run(&cli).await {
        Output::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Ensure data directory exists
    std::fs::create_dir_all(settings.data_dir())?;

    match &cli.command {
        Commands::Ask { question, session } => {
            commands::run_ask(question, session.clone(), settings).await?;
        }

        Commands::Ingest { path, force } => {
            commands::run_ingest(path, *force, settings).await?;
        }

        Commands::List => {
            commands::run_list(settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host, *port, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings)?;
        }
    }

    Ok(())
}
