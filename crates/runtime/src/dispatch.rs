//! Single-turn function-calling loop.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::model::{
    Backend, FinishReason, Message, ModelRequest, Part, Role, ToolCall, ToolChoice, ToolResult,
};
use crate::tools::{ToolKind, ToolOutput, ToolRegistry};
use crate::{Error, Result};

/// Returned in place of an empty model reply.
pub const CLARIFICATION_PROMPT: &str =
    "Sorry, I couldn't come up with an answer. Could you rephrase your question?";

/// Tool output used when the model names a tool that is not registered.
pub const UNKNOWN_TOOL_TEXT: &str = "function not implemented";

/// A validated user message.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    user_message: String,
}

impl ChatRequest {
    /// Fails with [`Error::EmptyMessage`] for empty or whitespace-only input.
    pub fn new(user_message: impl Into<String>) -> Result<Self> {
        let user_message = user_message.into();
        let trimmed = user_message.trim();
        if trimmed.is_empty() {
            return Err(Error::EmptyMessage);
        }
        Ok(Self {
            user_message: trimmed.to_string(),
        })
    }

    pub fn user_message(&self) -> &str {
        &self.user_message
    }
}

/// The final outcome of a turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatResponse {
    pub response_text: String,
    /// Set only when a renderable tool ran and succeeded.
    pub payload: Option<Value>,
}

impl ChatResponse {
    fn new(text: String, payload: Option<Value>) -> Self {
        let response_text = if text.trim().is_empty() {
            CLARIFICATION_PROMPT.to_string()
        } else {
            text
        };
        Self {
            response_text,
            payload,
        }
    }
}

/// Runs one user turn: at most two completion calls and one tool invocation.
pub struct Dispatcher<B> {
    backend: Arc<B>,
    registry: Arc<ToolRegistry>,
    system: Option<String>,
}

impl<B: Backend> Dispatcher<B> {
    pub fn new(backend: Arc<B>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            backend,
            registry,
            system: None,
        }
    }

    /// Set the system instruction sent with every completion call.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub async fn run(&self, request: ChatRequest) -> Result<ChatResponse> {
        let specs = self.registry.describe_all();
        let mut messages = vec![Message::user(request.user_message)];

        let first = self
            .backend
            .call(ModelRequest {
                system: self.system.as_deref(),
                messages: &messages,
                tools: &specs,
                tool_choice: ToolChoice::Auto,
            })
            .await?;
        debug!(usage = ?first.usage, finish = ?first.finish_reason, "first reply");

        if let FinishReason::ContentFilter(reason) = first.finish_reason {
            warn!(%reason, "reply withheld by content policy");
            return Err(Error::Blocked(reason));
        }

        let mut calls = first.message.tool_calls().into_iter();
        let Some(call) = calls.next() else {
            return Ok(ChatResponse::new(first.message.text(), None));
        };
        let ignored = calls.count();
        if ignored > 0 {
            warn!(ignored, tool = %call.name, "only the first tool call is honoured");
        }

        let (kind, output) = self.invoke(&call).await;

        messages.push(Message {
            role: Role::Assistant,
            parts: vec![Part::ToolCall(call.clone())],
        });
        messages.push(Message::tool_result(ToolResult {
            tool_call_id: call.id,
            name: call.name,
            output: output.clone(),
        }));

        let second = self
            .backend
            .call(ModelRequest {
                system: self.system.as_deref(),
                messages: &messages,
                tools: &specs,
                tool_choice: ToolChoice::None,
            })
            .await?;
        debug!(usage = ?second.usage, finish = ?second.finish_reason, "continuation reply");

        if !second.message.tool_calls().is_empty() {
            warn!("continuation requested another tool call; not re-entering");
        }

        let payload = match kind {
            Some(kind) if kind.is_renderable() && output.succeeded => output.payload,
            _ => None,
        };
        Ok(ChatResponse::new(second.message.text(), payload))
    }

    /// Resolve and run a tool call. Never fails: every problem becomes a
    /// failed [`ToolOutput`].
    async fn invoke(&self, call: &ToolCall) -> (Option<ToolKind>, ToolOutput) {
        let tool = match self.registry.get(&call.name) {
            Ok(tool) => tool,
            Err(e) => {
                warn!(tool = %call.name, "{e}");
                return (None, ToolOutput::failure(UNKNOWN_TOOL_TEXT));
            }
        };

        info!(tool = %tool.kind, input = %call.input, "invoking tool");
        let output = match tool.handler.invoke(&call.input).await {
            Ok(output) => output,
            Err(e) => {
                warn!(tool = %tool.kind, "tool failed: {e}");
                ToolOutput::failure(e.to_string())
            }
        };
        info!(tool = %tool.kind, succeeded = output.succeeded, "tool finished");

        (Some(tool.kind), output)
    }
}
