//! Ingest command: load course documents from a JSON file.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::vector_store::{Course, CourseChunk};
use serde::Deserialize;
use std::path::Path;

/// One course document as produced by an external chunking pipeline.
#[derive(Deserialize)]
struct CourseDocument {
    course: Course,
    chunks: Vec<CourseChunk>,
}

pub async fn run_ingest(path: &Path, force: bool, settings: Settings) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)?;
    let documents: Vec<CourseDocument> = serde_json::from_str(&content)?;

    if documents.is_empty() {
        Output::warning("No course documents found in file.");
        return Ok(());
    }

    let orchestrator = Orchestrator::new(&settings)?;
    let existing = orchestrator.existing_course_titles().await?;

    let pb = Output::progress_bar(documents.len() as u64, "Ingesting courses");
    let mut added = 0;
    let mut skipped = 0;

    for doc in &documents {
        if !force && existing.contains(&doc.course.title) {
            skipped += 1;
            pb.inc(1);
            continue;
        }

        let chunks = orchestrator.add_course(&doc.course, &doc.chunks).await?;
        pb.set_message(format!("{} ({} chunks)", doc.course.title, chunks));
        added += 1;
        pb.inc(1);
    }

    pb.finish_and_clear();

    Output::success(&format!(
        "Ingested {} course(s), skipped {} already indexed.",
        added, skipped
    ));

    Ok(())
}
