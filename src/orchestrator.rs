//! Top-level wiring: composes the store, tools, generator, and sessions into
//! the single `query` entry point used by the CLI and the HTTP server.

use crate::config::Settings;
use crate::embedding::OpenAIEmbedder;
use crate::error::{KursError, Result};
use crate::generator::{ChatModel, OpenAIChatModel, ResponseGenerator};
use crate::session::SessionManager;
use crate::tools::{OutlineTool, SearchTool, Source, ToolManager};
use crate::vector_store::{Course, CourseChunk, CourseStore, MemoryBackend, SqliteBackend};
use std::sync::Arc;
use tracing::{info, instrument};

/// Answer to one query, with the citations gathered along the way.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub answer: String,
    pub sources: Vec<Source>,
    pub session_id: String,
}

/// Catalog statistics for the courses endpoint.
#[derive(Debug, Clone)]
pub struct CourseAnalytics {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}

/// Owns every component and runs the query pipeline.
pub struct Orchestrator {
    store: Arc<CourseStore>,
    tools: ToolManager,
    generator: ResponseGenerator,
    sessions: SessionManager,
}

impl Orchestrator {
    /// Build the full production stack from settings.
    pub fn new(settings: &Settings) -> Result<Self> {
        let embedder = Arc::new(OpenAIEmbedder::new(&settings.embedding)?);

        let store = match settings.vector_store.provider.as_str() {
            "sqlite" => Arc::new(CourseStore::new(
                Arc::new(SqliteBackend::new(&settings.sqlite_path())?),
                embedder,
                settings.vector_store.max_results,
            )),
            "memory" => Arc::new(CourseStore::new(
                Arc::new(MemoryBackend::new()),
                embedder,
                settings.vector_store.max_results,
            )),
            other => {
                return Err(KursError::Config(format!(
                    "Unknown vector store provider '{}'",
                    other
                )))
            }
        };

        let model = Arc::new(OpenAIChatModel::new(&settings.generator)?);

        Ok(Self::with_components(
            store,
            model,
            settings.generator.max_tool_rounds,
            settings.session.max_history,
        ))
    }

    /// Assemble from pre-built components; tests inject fakes here.
    pub fn with_components(
        store: Arc<CourseStore>,
        model: Arc<dyn ChatModel>,
        max_tool_rounds: usize,
        max_history: usize,
    ) -> Self {
        let mut tools = ToolManager::new();
        tools.register(Arc::new(SearchTool::new(store.clone())));
        tools.register(Arc::new(OutlineTool::new(store.clone())));

        Self {
            store,
            tools,
            generator: ResponseGenerator::new(model, max_tool_rounds),
            sessions: SessionManager::new(max_history),
        }
    }

    /// Run one query through the tool-calling pipeline.
    ///
    /// A missing session id starts a new session; the exchange is recorded
    /// after a successful answer so follow-ups see it as history.
    #[instrument(skip_all, fields(query = %query))]
    pub async fn query(&self, query: &str, session_id: Option<&str>) -> Result<QueryOutcome> {
        let session_id = match session_id {
            Some(id) => id.to_string(),
            None => self.sessions.create_session(),
        };

        let history = self.sessions.get_history(&session_id);

        let answer = self
            .generator
            .generate(
                query,
                history.as_deref(),
                Some(self.tools.definitions()),
                Some(&self.tools),
            )
            .await?;

        let sources = self.tools.last_sources();
        self.tools.reset_sources();

        self.sessions.add_exchange(&session_id, query, &answer);

        Ok(QueryOutcome {
            answer,
            sources,
            session_id,
        })
    }

    /// Catalog statistics.
    pub async fn get_course_analytics(&self) -> Result<CourseAnalytics> {
        Ok(CourseAnalytics {
            total_courses: self.store.get_course_count().await?,
            course_titles: self.store.get_existing_course_titles().await?,
        })
    }

    /// Ingest one course with its content chunks.
    pub async fn add_course(&self, course: &Course, chunks: &[CourseChunk]) -> Result<usize> {
        self.store.add_course_metadata(course).await?;
        let added = self.store.add_course_content(chunks).await?;
        info!("Ingested '{}' with {} chunks", course.title, added);
        Ok(added)
    }

    /// Titles already present in the catalog, for skip-existing ingestion.
    pub async fn existing_course_titles(&self) -> Result<Vec<String>> {
        self.store.get_existing_course_titles().await
    }

    /// Full metadata for every indexed course.
    pub async fn list_courses(&self) -> Result<Vec<Course>> {
        self.store.get_all_courses_metadata().await
    }
}
