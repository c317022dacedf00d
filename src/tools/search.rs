//! Content search tool.

use super::{Source, Tool};
use crate::vector_store::CourseStore;
use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Searches course content with optional course and lesson filtering.
pub struct SearchTool {
    store: Arc<CourseStore>,
    last_sources: Mutex<Vec<Source>>,
}

impl SearchTool {
    pub fn new(store: Arc<CourseStore>) -> Self {
        Self {
            store,
            last_sources: Mutex::new(Vec::new()),
        }
    }

    /// Format matched chunks as labeled blocks and record one source per
    /// distinct (course, lesson) pair.
    async fn format_results(&self, results: &crate::vector_store::SearchResults) -> String {
        let mut blocks = Vec::with_capacity(results.documents.len());
        let mut seen: Vec<(String, Option<u32>)> = Vec::new();

        for (doc, meta) in results.documents.iter().zip(&results.metadata) {
            let header = match meta.lesson_number {
                Some(n) => format!("[{} - Lesson {}]", meta.course_title, n),
                None => format!("[{}]", meta.course_title),
            };
            blocks.push(format!("{}\n{}", header, doc));

            let key = (meta.course_title.clone(), meta.lesson_number);
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);

            // Link lookup is best-effort; absence never fails the call
            let (display, link) = match meta.lesson_number {
                Some(n) => (
                    format!("{} - Lesson {}", meta.course_title, n),
                    self.store
                        .get_lesson_link(&meta.course_title, n)
                        .await
                        .unwrap_or(None),
                ),
                None => (
                    meta.course_title.clone(),
                    self.store
                        .get_course_link(&meta.course_title)
                        .await
                        .unwrap_or(None),
                ),
            };

            self.last_sources
                .lock()
                .unwrap()
                .push(Source { display, link });
        }

        blocks.join("\n\n")
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &'static str {
        "search_course_content"
    }

    fn definition(&self) -> ChatCompletionTool {
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: self.name().to_string(),
                description: Some(
                    "Search course materials with smart course name matching and lesson filtering"
                        .to_string(),
                ),
                parameters: Some(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "What to search for in the course content"
                        },
                        "course_name": {
                            "type": "string",
                            "description": "Course title (partial matches work, e.g. 'MCP', 'Introduction')"
                        },
                        "lesson_number": {
                            "type": "integer",
                            "description": "Specific lesson number to search within (e.g. 1, 2, 3)"
                        }
                    },
                    "required": ["query"]
                })),
                strict: None,
            },
        }
    }

    async fn execute(&self, args: &serde_json::Value) -> String {
        self.reset_sources();

        let Some(query) = args["query"].as_str() else {
            return "Missing required 'query' argument".to_string();
        };
        let course_name = args["course_name"].as_str();
        // Out-of-range numbers are dropped rather than wrapped into a
        // different lesson
        let lesson_number = args["lesson_number"]
            .as_u64()
            .and_then(|n| u32::try_from(n).ok());

        debug!(
            "Searching content: query='{}' course={:?} lesson={:?}",
            query, course_name, lesson_number
        );

        let results = self.store.search(query, course_name, lesson_number).await;

        if let Some(error) = results.error {
            return error;
        }

        if results.is_empty() {
            let mut filter_info = String::new();
            if let Some(course) = course_name {
                filter_info.push_str(&format!(" in course '{}'", course));
            }
            if let Some(lesson) = lesson_number {
                filter_info.push_str(&format!(" in lesson {}", lesson));
            }
            return format!("No relevant content found{}.", filter_info);
        }

        self.format_results(&results).await
    }

    fn last_sources(&self) -> Vec<Source> {
        self.last_sources.lock().unwrap().clone()
    }

    fn reset_sources(&self) {
        self.last_sources.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::test_support::{sample_course, CountingBackend, FakeEmbedder};
    use crate::vector_store::CourseChunk;

    const COMPUTER_USE: &str = "Building Toward Computer Use with Anthropic";

    async fn tool_with_data() -> SearchTool {
        let embedder = Arc::new(FakeEmbedder::new(&[
            (COMPUTER_USE, vec![1.0, 0.0, 0.0]),
            ("Computer Use", vec![0.9, 0.1, 0.0]),
            ("api basics", vec![1.0, 0.0, 0.0]),
            ("lesson zero welcome", vec![0.9, 0.1, 0.0]),
        ]));
        let store = Arc::new(CourseStore::new(
            Arc::new(CountingBackend::new()),
            embedder,
            5,
        ));

        store
            .add_course_metadata(&sample_course(COMPUTER_USE, "colt"))
            .await
            .unwrap();
        store
            .add_course_content(&[
                CourseChunk {
                    content: "api basics".to_string(),
                    course_title: COMPUTER_USE.to_string(),
                    lesson_number: Some(1),
                    chunk_index: 0,
                },
                CourseChunk {
                    content: "lesson zero welcome".to_string(),
                    course_title: COMPUTER_USE.to_string(),
                    lesson_number: Some(0),
                    chunk_index: 1,
                },
            ])
            .await
            .unwrap();

        SearchTool::new(store)
    }

    #[test]
    fn test_definition_shape() {
        let tool = tool_with_definition();
        let def = tool.function;
        assert_eq!(def.name, "search_course_content");
        let params = def.parameters.unwrap();
        assert!(params["properties"]["query"].is_object());
        assert_eq!(params["required"][0], "query");
    }

    fn tool_with_definition() -> ChatCompletionTool {
        let embedder = Arc::new(FakeEmbedder::new(&[]));
        let store = Arc::new(CourseStore::new(
            Arc::new(CountingBackend::new()),
            embedder,
            5,
        ));
        SearchTool::new(store).definition()
    }

    #[tokio::test]
    async fn test_execute_formats_blocks_and_tracks_sources() {
        let tool = tool_with_data().await;

        let result = tool.execute(&serde_json::json!({"query": "api basics"})).await;

        assert!(result.contains(&format!("[{} - Lesson 1]", COMPUTER_USE)));
        assert!(result.contains("api basics"));

        // Two distinct (course, lesson) pairs -> two sources
        let sources = tool.last_sources();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].display, format!("{} - Lesson 1", COMPUTER_USE));
        // Lesson 0 has a link in the fixture, lesson 1 does not
        assert_eq!(sources[0].link, None);
        assert_eq!(
            sources[1].link,
            Some("https://example.com/lesson0".to_string())
        );
    }

    #[tokio::test]
    async fn test_sources_reset_between_executions() {
        let tool = tool_with_data().await;

        tool.execute(&serde_json::json!({"query": "api basics"})).await;
        assert_eq!(tool.last_sources().len(), 2);

        // A query constrained to a lesson with no matches yields no sources
        let result = tool
            .execute(&serde_json::json!({"query": "api basics", "lesson_number": 42}))
            .await;
        assert!(result.starts_with("No relevant content found"));
        assert_eq!(tool.last_sources().len(), 0);
    }

    #[tokio::test]
    async fn test_out_of_range_lesson_number_does_not_alias() {
        let tool = tool_with_data().await;

        // u32::MAX + 2 would wrap to lesson 1 under a plain cast; it must
        // not narrow the search to that lesson
        let result = tool
            .execute(&serde_json::json!({
                "query": "api basics",
                "lesson_number": 4_294_967_297u64
            }))
            .await;

        assert!(result.contains(&format!("[{} - Lesson 1]", COMPUTER_USE)));
        assert!(result.contains(&format!("[{} - Lesson 0]", COMPUTER_USE)));
        assert_eq!(tool.last_sources().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_result_mentions_filters() {
        let tool = tool_with_data().await;

        let result = tool
            .execute(&serde_json::json!({
                "query": "api basics",
                "course_name": "Computer Use",
                "lesson_number": 99
            }))
            .await;

        assert!(result.contains("No relevant content found"));
        assert!(result.contains("in course 'Computer Use'"));
        assert!(result.contains("in lesson 99"));
    }

    #[tokio::test]
    async fn test_store_error_propagated_verbatim() {
        // Empty catalog: course resolution misses and the error text is
        // returned to the model unchanged
        let embedder = Arc::new(FakeEmbedder::new(&[]));
        let store = Arc::new(CourseStore::new(
            Arc::new(CountingBackend::new()),
            embedder,
            5,
        ));
        let tool = SearchTool::new(store);

        let result = tool
            .execute(&serde_json::json!({
                "query": "anything",
                "course_name": "Quantum Basket Weaving"
            }))
            .await;

        assert_eq!(result, "No course found matching 'Quantum Basket Weaving'");
        assert!(tool.last_sources().is_empty());
    }

    #[tokio::test]
    async fn test_missing_query_argument() {
        let tool = tool_with_data().await;
        let result = tool.execute(&serde_json::json!({})).await;
        assert_eq!(result, "Missing required 'query' argument");
    }
}
