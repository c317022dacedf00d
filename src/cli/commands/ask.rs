//! Ask command: one question through the tool-calling pipeline.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;

pub async fn run_ask(
    question: &str,
    session: Option<String>,
    settings: Settings,
) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::new(&settings)?;

    let spinner = Output::spinner("Thinking...");
    let outcome = orchestrator.query(question, session.as_deref()).await;
    spinner.finish_and_clear();

    let outcome = outcome?;

    println!("{}", outcome.answer);

    if !outcome.sources.is_empty() {
        Output::header("Sources");
        for source in &outcome.sources {
            Output::source(&source.display, source.link.as_deref());
        }
    }

    println!();
    Output::kv("Session", &outcome.session_id);

    Ok(())
}
