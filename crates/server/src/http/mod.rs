//! HTTP transport: `POST /chat` and `GET /health`.

mod error;

pub use error::ApiError;

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::{get, post};
use axum::{Json, Router};
use runtime::{Backend, ChatRequest, Dispatcher};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

/// Inbound chat body.
#[derive(Debug, Deserialize)]
pub struct ChatBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// Successful chat reply.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub response: String,
    pub weather_data: Option<Value>,
}

pub fn router<B: Backend + 'static>(dispatcher: Arc<Dispatcher<B>>) -> Router {
    Router::new()
        .route("/chat", post(chat::<B>))
        .route("/health", get(health))
        .with_state(dispatcher)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve until Ctrl+C.
pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await
}

async fn health() -> &'static str {
    "ok"
}

async fn chat<B: Backend + 'static>(
    State(dispatcher): State<Arc<Dispatcher<B>>>,
    body: Result<Json<ChatBody>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let message = match body {
        Ok(Json(body)) => body.message.unwrap_or_default(),
        Err(rejection) => {
            debug!("unreadable chat body: {rejection}");
            String::new()
        }
    };
    let request = ChatRequest::new(message)?;
    info!(message = request.user_message(), "received from user");

    let response = dispatcher.run(request).await?;
    info!(
        response = %response.response_text,
        weather = response.payload.is_some(),
        "sending to user"
    );

    Ok(Json(ChatReply {
        response: response.response_text,
        weather_data: response.payload,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lookups::{CurrentTime, CurrentWeather, TimeConfig, WeatherConfig};
    use runtime::testing::ScriptedBackend;
    use runtime::{
        CLARIFICATION_PROMPT, FinishReason, Message, ModelError, ModelRequest, ModelResponse,
        Part, Role, Tool, ToolKind, ToolRegistry, Usage,
    };
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    async fn spawn(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}")
    }

    async fn post_chat(base: &str, body: Value) -> (u16, Value) {
        let response = reqwest::Client::new()
            .post(format!("{base}/chat"))
            .json(&body)
            .send()
            .await
            .expect("send");
        let status = response.status().as_u16();
        (status, response.json().await.expect("json body"))
    }

    async fn chat_server<B: Backend + 'static>(backend: Arc<B>, registry: ToolRegistry) -> String {
        let dispatcher = Dispatcher::new(backend, Arc::new(registry));
        spawn(router(Arc::new(dispatcher))).await
    }

    /// Asks for one tool, then answers with whatever the tool reported.
    struct Relay {
        tool: &'static str,
        input: Value,
        calls: AtomicUsize,
    }

    impl Backend for Relay {
        async fn call(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
            let parts = if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                vec![Part::ToolCall(runtime::ToolCall {
                    id: "1".into(),
                    name: self.tool.into(),
                    input: self.input.clone(),
                })]
            } else {
                let reported = request
                    .messages
                    .iter()
                    .flat_map(|m| &m.parts)
                    .find_map(|p| match p {
                        Part::ToolResult(r) => Some(r.output.display_text.clone()),
                        _ => None,
                    })
                    .unwrap_or_default();
                vec![Part::Text(format!("Aqui está: {reported}"))]
            };
            Ok(ModelResponse {
                message: Message {
                    role: Role::Assistant,
                    parts,
                },
                finish_reason: FinishReason::Stop,
                usage: Usage::default(),
            })
        }
    }

    #[tokio::test]
    async fn health_is_ok() {
        let base = chat_server(Arc::new(ScriptedBackend::default()), ToolRegistry::new()).await;
        let body = reqwest::get(format!("{base}/health"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn empty_or_missing_message_is_400() {
        let backend = Arc::new(ScriptedBackend::default());
        let base = chat_server(backend.clone(), ToolRegistry::new()).await;

        for body in [
            json!({ "message": "" }),
            json!({}),
            json!({ "message": "   " }),
            json!({ "message": 42 }),
        ] {
            let (status, reply) = post_chat(&base, body).await;
            assert_eq!(status, 400);
            assert_eq!(reply, json!({ "error": "no message received" }));
        }
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn non_json_body_is_400() {
        let base = chat_server(Arc::new(ScriptedBackend::default()), ToolRegistry::new()).await;
        let response = reqwest::Client::new()
            .post(format!("{base}/chat"))
            .body("message=oi")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
    }

    #[tokio::test]
    async fn greeting_needs_no_tool() {
        let backend = Arc::new(ScriptedBackend::new([ScriptedBackend::text(
            "Oi! Como posso ajudar?",
        )]));
        let base = chat_server(backend.clone(), ToolRegistry::new()).await;

        let (status, reply) = post_chat(&base, json!({ "message": "oi" })).await;

        assert_eq!(status, 200);
        assert_eq!(reply, json!({ "response": "Oi! Como posso ajudar?", "weatherData": null }));
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn time_question_in_curitiba() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::<String>::new()));
        let seen_by_provider = seen.clone();
        let provider = spawn(Router::new().route(
            "/api/timezone/*zone",
            get(move |axum::extract::Path(zone): axum::extract::Path<String>| {
                let seen = seen_by_provider.clone();
                async move {
                    seen.lock().unwrap().push(zone);
                    Json(json!({
                        "datetime": "2026-10-19T14:03:12.000000-03:00",
                        "timezone": "America/Sao_Paulo"
                    }))
                }
            }),
        ))
        .await;

        let time = CurrentTime::new(
            TimeConfig {
                base_url: format!("{provider}/api"),
                ..TimeConfig::default()
            },
            Duration::from_secs(5),
        )
        .unwrap();
        let registry = ToolRegistry::new()
            .with(Tool::new(
                ToolKind::CurrentTime,
                lookups::time::DESCRIPTION,
                lookups::time::schema("America/Sao_Paulo"),
                Arc::new(time),
            ))
            .unwrap();
        let backend = Arc::new(Relay {
            tool: "getCurrentTime",
            input: json!({ "timezone": "America/Sao_Paulo" }),
            calls: AtomicUsize::new(0),
        });
        let base = chat_server(backend.clone(), registry).await;

        let question = json!({ "message": "que horas são em Curitiba?" });
        let (status, reply) = post_chat(&base, question).await;

        assert_eq!(status, 200);
        let text = reply["response"].as_str().unwrap();
        assert!(text.contains("19/10/2026"), "{text}");
        assert!(text.contains("14:03:12"), "{text}");
        assert_eq!(reply["weatherData"], Value::Null);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
        assert!(seen.lock().unwrap()[0].ends_with("America/Sao_Paulo"));
    }

    #[tokio::test]
    async fn weather_payload_is_returned() {
        let provider = spawn(Router::new().route(
            "/data/2.5/weather",
            get(|| async {
                Json(json!({
                    "name": "Curitiba",
                    "sys": { "country": "BR" },
                    "weather": [{ "description": "chuva leve", "icon": "10d" }],
                    "main": { "temp": 15.2, "humidity": 90 },
                    "wind": { "speed": 4.0 }
                }))
            }),
        ))
        .await;
        let weather = CurrentWeather::new(
            WeatherConfig {
                api_key: Some("key".into()),
                base_url: provider,
                ..WeatherConfig::default()
            },
            Duration::from_secs(5),
        )
        .unwrap();
        let registry = ToolRegistry::new()
            .with(Tool::new(
                ToolKind::CurrentWeather,
                lookups::weather::DESCRIPTION,
                lookups::weather::schema(),
                Arc::new(weather),
            ))
            .unwrap();
        let backend = Arc::new(Relay {
            tool: "getCurrentWeather",
            input: json!({ "location": "Curitiba, BR" }),
            calls: AtomicUsize::new(0),
        });
        let base = chat_server(backend, registry).await;

        let question = json!({ "message": "vai chover em Curitiba?" });
        let (status, reply) = post_chat(&base, question).await;

        assert_eq!(status, 200);
        let data = &reply["weatherData"];
        assert_eq!(data["locationName"], "Curitiba");
        assert_eq!(data["description"], "chuva leve");
        assert_eq!(data["temperature"], 15.2);
    }

    #[tokio::test]
    async fn unconfigured_weather_is_not_a_500() {
        let weather =
            CurrentWeather::new(WeatherConfig::default(), Duration::from_secs(1)).unwrap();
        let registry = ToolRegistry::new()
            .with(Tool::new(
                ToolKind::CurrentWeather,
                lookups::weather::DESCRIPTION,
                lookups::weather::schema(),
                Arc::new(weather),
            ))
            .unwrap();
        let backend = Arc::new(Relay {
            tool: "getCurrentWeather",
            input: json!({ "location": "Curitiba" }),
            calls: AtomicUsize::new(0),
        });
        let base = chat_server(backend, registry).await;

        let (status, reply) = post_chat(&base, json!({ "message": "tempo em Curitiba" })).await;

        assert_eq!(status, 200);
        assert!(reply["response"].as_str().unwrap().contains("not configured"));
        assert_eq!(reply["weatherData"], Value::Null);
    }

    #[tokio::test]
    async fn empty_location_resolves_without_weather_data() {
        let weather = CurrentWeather::new(
            WeatherConfig {
                api_key: Some("key".into()),
                base_url: "http://127.0.0.1:9".into(),
                ..WeatherConfig::default()
            },
            Duration::from_secs(1),
        )
        .unwrap();
        let registry = ToolRegistry::new()
            .with(Tool::new(
                ToolKind::CurrentWeather,
                lookups::weather::DESCRIPTION,
                lookups::weather::schema(),
                Arc::new(weather),
            ))
            .unwrap();
        let backend = Arc::new(Relay {
            tool: "getCurrentWeather",
            input: json!({ "location": "" }),
            calls: AtomicUsize::new(0),
        });
        let base = chat_server(backend, registry).await;

        let (status, reply) = post_chat(&base, json!({ "message": "como está o tempo?" })).await;

        assert_eq!(status, 200);
        assert!(!reply["response"].as_str().unwrap().is_empty());
        assert_eq!(reply["weatherData"], Value::Null);
    }

    #[tokio::test]
    async fn provider_failures_map_to_status_codes() {
        let cases = [
            (ModelError::Blocked("SAFETY".into()), 400, "message blocked: SAFETY"),
            (ModelError::Unauthorized("API key not valid".into()), 401, ""),
            (ModelError::QuotaExceeded("quota".into()), 429, ""),
            (ModelError::Network("connection reset".into()), 500, ""),
        ];
        for (err, expected_status, expected_message) in cases {
            let backend = Arc::new(ScriptedBackend::new([Err(err)]));
            let base = chat_server(backend, ToolRegistry::new()).await;

            let (status, reply) = post_chat(&base, json!({ "message": "oi" })).await;

            assert_eq!(status, expected_status);
            let message = reply["error"].as_str().unwrap();
            assert!(!message.is_empty());
            if !expected_message.is_empty() {
                assert_eq!(message, expected_message);
            }
        }
    }

    #[tokio::test]
    async fn empty_model_reply_becomes_clarification() {
        let backend = Arc::new(ScriptedBackend::new([ScriptedBackend::text("")]));
        let base = chat_server(backend, ToolRegistry::new()).await;

        let (status, reply) = post_chat(&base, json!({ "message": "hmm" })).await;

        assert_eq!(status, 200);
        assert_eq!(reply["response"], CLARIFICATION_PROMPT);
    }
}
