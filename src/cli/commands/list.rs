//! List command: show indexed courses.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;

pub async fn run_list(settings: Settings) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::new(&settings)?;
    let courses = orchestrator.list_courses().await?;

    if courses.is_empty() {
        Output::info("No courses indexed yet. Use 'kurs ingest' to add some.");
        return Ok(());
    }

    Output::header(&format!("Indexed Courses ({})", courses.len()));
    for course in &courses {
        Output::course_info(&course.title, &course.instructor, course.lessons.len());
    }

    Ok(())
}
