//! Gemini API backend.

use crate::model::{
    Backend, FinishReason, Message, ModelError, ModelRequest, ModelResponse, Part, Role, ToolCall,
    ToolChoice, ToolResult, ToolSpec, Usage,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

// ─────────────────────────────────────────────────────────────────────────────
// API Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiRequest {
    contents: Vec<ApiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<ApiContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_config: Option<ApiToolConfig>,
    generation_config: ApiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct ApiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ApiPart>,
}

/// One content part; exactly one field is set.
#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ApiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<ApiFunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<ApiFunctionResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiTool {
    function_declarations: Vec<ApiFunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct ApiFunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiToolConfig {
    function_calling_config: ApiFunctionCallingConfig,
}

#[derive(Debug, Serialize)]
struct ApiFunctionCallingConfig {
    mode: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiGenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<ApiPromptFeedback>,
    #[serde(default)]
    usage_metadata: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCandidate {
    #[serde(default)]
    content: Option<ApiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for creating a Gemini backend.
#[derive(Debug, Clone)]
pub struct GeminiBackendBuilder {
    api_key: String,
    model: String,
    max_tokens: u32,
    base_url: String,
    timeout: Option<Duration>,
}

impl GeminiBackendBuilder {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: 1024,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<GeminiBackend, ModelError> {
        let mut client = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            client = client.timeout(timeout);
        }
        let client = client
            .build()
            .map_err(|e| ModelError::Network(format!("http client: {e}")))?;

        Ok(GeminiBackend {
            client,
            api_key: self.api_key,
            model: self.model,
            max_tokens: self.max_tokens,
            base_url: self.base_url,
        })
    }
}

/// Gemini `generateContent` backend.
pub struct GeminiBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    base_url: String,
}

impl GeminiBackend {
    pub fn builder(api_key: impl Into<String>, model: impl Into<String>) -> GeminiBackendBuilder {
        GeminiBackendBuilder::new(api_key, model)
    }

    fn role_to_api(role: Role) -> &'static str {
        match role {
            Role::User => "user",
            Role::Assistant => "model",
        }
    }

    fn part_to_api(part: &Part) -> ApiPart {
        match part {
            Part::Text(text) => ApiPart {
                text: Some(text.clone()),
                ..Default::default()
            },
            Part::ToolCall(call) => ApiPart {
                function_call: Some(ApiFunctionCall {
                    name: call.name.clone(),
                    args: call.input.clone(),
                }),
                ..Default::default()
            },
            Part::ToolResult(result) => ApiPart {
                function_response: Some(Self::tool_result_to_api(result)),
                ..Default::default()
            },
        }
    }

    fn tool_result_to_api(result: &ToolResult) -> ApiFunctionResponse {
        let ToolResult { name, output, .. } = result;
        ApiFunctionResponse {
            name: name.clone(),
            response: json!({
                "name": name,
                "content": output.display_text,
                "succeeded": output.succeeded,
                "data": output.payload,
            }),
        }
    }

    fn message_to_api(msg: &Message) -> ApiContent {
        ApiContent {
            role: Some(Self::role_to_api(msg.role).to_string()),
            parts: msg.parts.iter().map(Self::part_to_api).collect(),
        }
    }

    fn tools_to_api(specs: &[ToolSpec]) -> Vec<ApiTool> {
        if specs.is_empty() {
            return Vec::new();
        }
        vec![ApiTool {
            function_declarations: specs
                .iter()
                .map(|spec| ApiFunctionDeclaration {
                    name: spec.name.clone(),
                    description: spec.description.clone(),
                    parameters: spec.schema.clone(),
                })
                .collect(),
        }]
    }

    fn build_request(&self, request: &ModelRequest<'_>) -> ApiRequest {
        let tools = Self::tools_to_api(request.tools);
        let tool_config = (!tools.is_empty()).then(|| ApiToolConfig {
            function_calling_config: ApiFunctionCallingConfig {
                mode: match request.tool_choice {
                    ToolChoice::Auto => "AUTO",
                    ToolChoice::None => "NONE",
                },
            },
        });

        ApiRequest {
            contents: request.messages.iter().map(Self::message_to_api).collect(),
            system_instruction: request.system.map(|s| ApiContent {
                role: None,
                parts: vec![ApiPart {
                    text: Some(s.to_string()),
                    ..Default::default()
                }],
            }),
            tools,
            tool_config,
            generation_config: ApiGenerationConfig {
                max_output_tokens: self.max_tokens,
            },
        }
    }

    fn parse_response(response: ApiResponse) -> Result<ModelResponse, ModelError> {
        if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(ModelError::Blocked(reason));
        }

        let usage = response
            .usage_metadata
            .map(|u| Usage {
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
            })
            .unwrap_or_default();

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::InvalidResponse("no candidates returned".into()))?;

        let parts: Vec<Part> = candidate
            .content
            .unwrap_or_default()
            .parts
            .into_iter()
            .filter_map(|part| {
                if let Some(call) = part.function_call {
                    Some(Part::ToolCall(ToolCall {
                        id: uuid::Uuid::new_v4().to_string(),
                        name: call.name,
                        input: call.args,
                    }))
                } else {
                    part.text.map(Part::Text)
                }
            })
            .collect();

        let has_calls = parts.iter().any(|p| matches!(p, Part::ToolCall(_)));
        let finish_reason = match candidate.finish_reason.as_deref() {
            _ if has_calls => FinishReason::ToolCalls,
            None | Some("STOP") => FinishReason::Stop,
            Some("MAX_TOKENS") => FinishReason::Length,
            Some(reason @ ("SAFETY" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII")) => {
                FinishReason::ContentFilter(reason.to_string())
            }
            Some(other) => FinishReason::Unknown(other.to_string()),
        };

        Ok(ModelResponse {
            message: Message {
                role: Role::Assistant,
                parts,
            },
            finish_reason,
            usage,
        })
    }
}

/// Map a non-2xx Gemini reply onto the error taxonomy.
fn classify_api_error(status: reqwest::StatusCode, body: &str) -> ModelError {
    let (message, api_status) = match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) => (envelope.error.message, envelope.error.status),
        Err(_) => (body.to_string(), String::new()),
    };

    if status == reqwest::StatusCode::UNAUTHORIZED
        || status == reqwest::StatusCode::FORBIDDEN
        || api_status == "UNAUTHENTICATED"
        || api_status == "PERMISSION_DENIED"
        || message.contains("API key not valid")
    {
        return ModelError::Unauthorized(message);
    }

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || api_status == "RESOURCE_EXHAUSTED"
        || message.to_lowercase().contains("quota")
    {
        return ModelError::QuotaExceeded(message);
    }

    ModelError::Api(format!("{status}: {message}"))
}

impl std::fmt::Display for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gemini({})", self.model)
    }
}

impl Backend for GeminiBackend {
    async fn call(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        if self.api_key.is_empty() {
            return Err(ModelError::Unauthorized("API key not configured".into()));
        }

        let api_request = self.build_request(&request);
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_api_error(status, &body));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        Self::parse_response(api_response)
    }
}
