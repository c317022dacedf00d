//! Tools exposed to the LLM and the registry that dispatches them.
//!
//! Tools return plain text in all cases. Retrieval failures, unknown names,
//! and bad arguments all degrade into text the model can reason about; only
//! transport failures escape as errors, and those happen above this layer.

mod outline;
mod search;

pub use outline::OutlineTool;
pub use search::SearchTool;

use async_openai::types::ChatCompletionTool;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A citation produced by a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Source {
    /// Display string, e.g. "Course Title - Lesson 1".
    pub display: String,
    /// Optional link to the cited lesson or course.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// A callable unit the LLM can invoke by name.
///
/// `execute` is infallible by contract: implementations fold every failure
/// into the returned text. Tracked sources are reset at the start of each
/// execution and drained by the manager after the query.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name as declared to the LLM.
    fn name(&self) -> &'static str;

    /// OpenAI function schema for this tool.
    fn definition(&self) -> ChatCompletionTool;

    /// Execute with parsed JSON arguments, returning result text.
    async fn execute(&self, args: &serde_json::Value) -> String;

    /// Sources recorded by the most recent execution.
    fn last_sources(&self) -> Vec<Source>;

    /// Clear tracked sources.
    fn reset_sources(&self);
}

/// Name-keyed tool registry; the single point through which the generator
/// touches tools.
#[derive(Default)]
pub struct ToolManager {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A later registration under the same name replaces the
    /// earlier one.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        if let Some(existing) = self.tools.iter_mut().find(|t| t.name() == tool.name()) {
            *existing = tool;
        } else {
            self.tools.push(tool);
        }
    }

    /// Schemas of all registered tools, in registration order.
    pub fn definitions(&self) -> Vec<ChatCompletionTool> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Dispatch a call by name. Unknown names come back as text, not errors.
    pub async fn execute_tool(&self, name: &str, args: &serde_json::Value) -> String {
        match self.tools.iter().find(|t| t.name() == name) {
            Some(tool) => tool.execute(args).await,
            None => format!("Tool '{}' not found", name),
        }
    }

    /// Sources from the last executed tool: the first non-empty list across
    /// registered tools.
    pub fn last_sources(&self) -> Vec<Source> {
        self.tools
            .iter()
            .map(|t| t.last_sources())
            .find(|s| !s.is_empty())
            .unwrap_or_default()
    }

    /// Clear tracked sources on every registered tool.
    pub fn reset_sources(&self) {
        for tool in &self.tools {
            tool.reset_sources();
        }
    }
}
