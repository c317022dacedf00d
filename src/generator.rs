//! Response generator with the sequential tool-calling loop.
//!
//! Drives a bounded multi-round protocol: the model sees the conversation plus
//! tool schemas, may request tool calls for up to `max_tool_rounds` rounds,
//! and is then forced into a tool-free final answer. Transport failures are
//! never retried; they propagate to the caller.

use crate::config::GeneratorSettings;
use crate::error::{KursError, Result};
use crate::openai::create_client;
use crate::tools::ToolManager;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolChoiceOption, ChatCompletionToolType,
    CreateChatCompletionRequestArgs, FunctionCall,
};
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// System prompt template; `{max_tool_rounds}` is substituted at call time and
/// prior conversation text is appended when present.
const SYSTEM_PROMPT: &str = r#"You are an AI assistant specialized in course materials and educational content, with access to tools for course information.

Available tools:
1. search_course_content: for questions about specific course content or lesson details
2. get_course_outline: for questions about course structure, lesson lists, or "what's in" a course

Tool usage:
- You can make up to {max_tool_rounds} separate rounds of tool calls to gather information
- Use results from earlier rounds to inform later calls, e.g. fetch an outline first, then search the lessons it mentions
- Answer general knowledge questions directly without tools
- Synthesize all tool results into one comprehensive answer

Response rules:
- Provide direct answers only; no meta-commentary about searches or tool usage
- Include course titles, instructors, links, and complete lesson lists when reporting outlines
- Keep answers clear, educational, and example-supported where that helps"#;

/// One tool call requested by the model.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub id: String,
    pub name: String,
    /// Raw JSON argument payload as produced by the model.
    pub arguments: String,
}

/// A single model response: either direct text, or one-or-more tool calls.
#[derive(Debug, Clone, Default)]
pub struct ModelTurn {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolInvocation>,
}

impl ModelTurn {
    /// Build a direct text turn.
    pub fn text(content: &str) -> Self {
        Self {
            content: Some(content.to_string()),
            tool_calls: Vec::new(),
        }
    }
}

/// LLM call boundary, kept narrow so tests can supply fakes.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Execute one chat completion. `tools` is None for the forced final call.
    async fn complete(
        &self,
        messages: Vec<ChatCompletionRequestMessage>,
        tools: Option<Vec<ChatCompletionTool>>,
    ) -> Result<ModelTurn>;
}

/// OpenAI-backed chat model with a fixed temperature and token budget.
pub struct OpenAIChatModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    max_tokens: u32,
}

impl OpenAIChatModel {
    /// Build a chat model from settings, validating them up front.
    pub fn new(settings: &GeneratorSettings) -> Result<Self> {
        if settings.model.is_empty() {
            return Err(KursError::Config(
                "generator.model must not be empty".to_string(),
            ));
        }
        if settings.max_tokens == 0 {
            return Err(KursError::Config(
                "generator.max_tokens must be positive".to_string(),
            ));
        }

        Ok(Self {
            client: create_client(Duration::from_secs(settings.request_timeout_secs))?,
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    async fn complete(
        &self,
        messages: Vec<ChatCompletionRequestMessage>,
        tools: Option<Vec<ChatCompletionTool>>,
    ) -> Result<ModelTurn> {
        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&self.model)
            .temperature(0.0)
            .max_tokens(self.max_tokens)
            .messages(messages);

        if let Some(tools) = tools {
            builder
                .tools(tools)
                .tool_choice(ChatCompletionToolChoiceOption::Auto);
        }

        let request = builder
            .build()
            .map_err(|e| KursError::Generator(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| KursError::OpenAI(format!("API call failed: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| KursError::OpenAI("No response from model".to_string()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolInvocation {
                id: tc.id,
                name: tc.function.name,
                arguments: tc.function.arguments,
            })
            .collect();

        Ok(ModelTurn {
            content: choice.message.content,
            tool_calls,
        })
    }
}

/// Drives the bounded tool-calling protocol against a chat model.
pub struct ResponseGenerator {
    model: Arc<dyn ChatModel>,
    max_tool_rounds: usize,
}

impl ResponseGenerator {
    pub fn new(model: Arc<dyn ChatModel>, max_tool_rounds: usize) -> Self {
        Self {
            model,
            max_tool_rounds,
        }
    }

    /// Generate a response for a query, calling tools through the manager for
    /// up to the configured number of rounds.
    #[instrument(skip_all, fields(query = %query))]
    pub async fn generate(
        &self,
        query: &str,
        conversation_history: Option<&str>,
        tools: Option<Vec<ChatCompletionTool>>,
        tool_manager: Option<&ToolManager>,
    ) -> Result<String> {
        let system_content = self.build_system_content(conversation_history);

        let mut messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_content)
                .build()
                .map_err(|e| KursError::Generator(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(query)
                .build()
                .map_err(|e| KursError::Generator(e.to_string()))?
                .into(),
        ];

        for round in 1..=self.max_tool_rounds {
            let turn = self.model.complete(messages.clone(), tools.clone()).await?;

            if turn.tool_calls.is_empty() {
                // Direct answer: terminal even with budget remaining
                debug!("Model answered directly in round {}", round);
                return Ok(turn.content.unwrap_or_default());
            }

            let Some(manager) = tool_manager else {
                return Ok("Tool use requested but no tool manager available".to_string());
            };

            info!("Round {}: {} tool call(s)", round, turn.tool_calls.len());

            messages.push(assistant_tool_call_message(&turn)?);

            // All invocations of a round run independently; results are
            // appended in request order
            let results = join_all(
                turn.tool_calls
                    .iter()
                    .map(|call| execute_invocation(call, manager)),
            )
            .await;

            for (call, result) in turn.tool_calls.iter().zip(results) {
                messages.push(
                    ChatCompletionRequestToolMessageArgs::default()
                        .tool_call_id(&call.id)
                        .content(result)
                        .build()
                        .map_err(|e| KursError::Generator(e.to_string()))?
                        .into(),
                );
            }
        }

        // Budget spent: one final call with no tools attached
        debug!("Round budget exhausted, forcing tool-free answer");
        let turn = self.model.complete(messages, None).await?;
        Ok(turn.content.unwrap_or_default())
    }

    fn build_system_content(&self, conversation_history: Option<&str>) -> String {
        let mut content =
            SYSTEM_PROMPT.replace("{max_tool_rounds}", &self.max_tool_rounds.to_string());
        if let Some(history) = conversation_history {
            content.push_str("\n\nPrevious conversation:\n");
            content.push_str(history);
        }
        content
    }
}

/// Execute one requested invocation; every failure becomes result text for
/// that invocation only.
async fn execute_invocation(call: &ToolInvocation, manager: &ToolManager) -> String {
    match serde_json::from_str::<serde_json::Value>(&call.arguments) {
        Ok(args) => manager.execute_tool(&call.name, &args).await,
        Err(e) => format!("Tool execution error: {}", e),
    }
}

/// Rebuild the model's tool-call turn as a request message.
fn assistant_tool_call_message(turn: &ModelTurn) -> Result<ChatCompletionRequestMessage> {
    let calls: Vec<ChatCompletionMessageToolCall> = turn
        .tool_calls
        .iter()
        .map(|call| ChatCompletionMessageToolCall {
            id: call.id.clone(),
            r#type: ChatCompletionToolType::Function,
            function: FunctionCall {
                name: call.name.clone(),
                arguments: call.arguments.clone(),
            },
        })
        .collect();

    let mut builder = ChatCompletionRequestAssistantMessageArgs::default();
    builder.tool_calls(calls);
    if let Some(content) = &turn.content {
        builder.content(content.clone());
    }

    Ok(builder
        .build()
        .map_err(|e| KursError::Generator(e.to_string()))?
        .into())
}
