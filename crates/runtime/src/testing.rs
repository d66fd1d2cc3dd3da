//! Scripted backend for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde_json::Value;

use crate::model::{
    Backend, FinishReason, Message, ModelError, ModelRequest, ModelResponse, Part, Role,
    ToolCall, ToolChoice, Usage,
};

/// What the backend saw on one call.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub system: Option<String>,
    pub messages: Vec<Message>,
    pub tools: Vec<String>,
    pub tool_choice: ToolChoice,
}

/// Replays canned replies in order and records every request.
///
/// Running out of replies yields `ModelError::Api`.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<ModelResponse, ModelError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedBackend {
    pub fn new(replies: impl IntoIterator<Item = Result<ModelResponse, ModelError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn response(parts: Vec<Part>) -> ModelResponse {
        let finish_reason = if parts.iter().any(|p| matches!(p, Part::ToolCall(_))) {
            FinishReason::ToolCalls
        } else {
            FinishReason::Stop
        };
        ModelResponse {
            message: Message {
                role: Role::Assistant,
                parts,
            },
            finish_reason,
            usage: Usage::default(),
        }
    }

    pub fn text(text: &str) -> Result<ModelResponse, ModelError> {
        Ok(Self::response(vec![Part::Text(text.to_string())]))
    }

    pub fn tool_call(name: &str, input: Value) -> Result<ModelResponse, ModelError> {
        Ok(Self::response(vec![Part::ToolCall(ToolCall {
            id: format!("call-{name}"),
            name: name.to_string(),
            input,
        })]))
    }

    pub fn filtered(reason: &str) -> Result<ModelResponse, ModelError> {
        let mut response = Self::response(Vec::new());
        response.finish_reason = FinishReason::ContentFilter(reason.to_string());
        Ok(response)
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Backend for ScriptedBackend {
    async fn call(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(RecordedRequest {
                system: request.system.map(str::to_string),
                messages: request.messages.to_vec(),
                tools: request.tools.iter().map(|t| t.name.clone()).collect(),
                tool_choice: request.tool_choice,
            });
        }
        self.replies
            .lock()
            .ok()
            .and_then(|mut replies| replies.pop_front())
            .unwrap_or_else(|| Err(ModelError::Api("script exhausted".into())))
    }
}
