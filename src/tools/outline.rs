//! Course outline tool.

use super::{Source, Tool};
use crate::vector_store::CourseStore;
use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Renders a course's title, instructor, link, and ordered lesson list.
pub struct OutlineTool {
    store: Arc<CourseStore>,
    last_sources: Mutex<Vec<Source>>,
}

impl OutlineTool {
    pub fn new(store: Arc<CourseStore>) -> Self {
        Self {
            store,
            last_sources: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Tool for OutlineTool {
    fn name(&self) -> &'static str {
        "get_course_outline"
    }

    fn definition(&self) -> ChatCompletionTool {
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: self.name().to_string(),
                description: Some(
                    "Get the outline of a course: title, instructor, link, and the full lesson list"
                        .to_string(),
                ),
                parameters: Some(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "course_title": {
                            "type": "string",
                            "description": "Course title (partial matches work)"
                        }
                    },
                    "required": ["course_title"]
                })),
                strict: None,
            },
        }
    }

    async fn execute(&self, args: &serde_json::Value) -> String {
        self.reset_sources();

        let Some(requested) = args["course_title"].as_str() else {
            return "Missing required 'course_title' argument".to_string();
        };

        let resolved = match self.store.resolve_course_name(requested).await {
            Ok(Some(title)) => title,
            Ok(None) => return format!("No course found matching '{}'", requested),
            Err(e) => return format!("Outline error: {}", e),
        };

        let course = match self.store.get_course(&resolved).await {
            Ok(Some(course)) => course,
            Ok(None) => return format!("No course found matching '{}'", requested),
            Err(e) => return format!("Outline error: {}", e),
        };

        let mut output = format!("Course: {}\nInstructor: {}", course.title, course.instructor);
        match &course.course_link {
            Some(link) => output.push_str(&format!("\nCourse Link: {}", link)),
            None => output.push_str("\nCourse Link: not available"),
        }

        if course.lessons.is_empty() {
            output.push_str("\n\nLesson list is not available for this course.");
        } else {
            output.push_str(&format!("\n\nLessons ({}):", course.lessons.len()));
            for lesson in &course.lessons {
                output.push_str(&format!(
                    "\n  Lesson {}: {}",
                    lesson.lesson_number, lesson.title
                ));
            }
        }

        self.last_sources.lock().unwrap().push(Source {
            display: course.title.clone(),
            link: course.course_link.clone(),
        });

        output
    }

    fn last_sources(&self) -> Vec<Source> {
        self.last_sources.lock().unwrap().clone()
    }

    fn reset_sources(&self) {
        self.last_sources.lock().unwrap().clear();
    }
}
