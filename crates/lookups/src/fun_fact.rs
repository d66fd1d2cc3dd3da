//! `getFunFact`: trivia produced by a second, independent completion call.
//!
//! Failures of that call are masked with a fixed fact: the user always gets
//! something back.

use std::sync::Arc;

use async_trait::async_trait;
use runtime::{Backend, Message, ModelRequest, ToolError, ToolHandler, ToolOutput, parse_args};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

pub const DESCRIPTION: &str = "Returns a short, surprising fun fact, optionally about a topic. \
Use it when the user asks for a curiosity, trivia or fun fact.";

pub const FALLBACK_FACT: &str = "Honey never spoils: archaeologists have found pots of \
honey in ancient Egyptian tombs that are over 3,000 years old and still edible.";

const DEFAULT_TOPIC: &str = "random";

const SYSTEM: &str = "You write one short fun fact: one or two sentences, no preamble, \
in the same language as the request.";

pub fn schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "topic": {
                "type": "string",
                "description": "Subject of the fact, e.g. \"space\" or \"animals\". Defaults to \"random\"."
            }
        }
    })
}

#[derive(Debug, Default, Deserialize)]
struct Args {
    #[serde(default)]
    topic: Option<String>,
}

/// Asks the completion service itself for a fact.
pub struct FunFact<B> {
    backend: Arc<B>,
}

impl<B: Backend> FunFact<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    async fn generate(&self, topic: &str) -> Option<String> {
        let prompt = if topic == DEFAULT_TOPIC {
            "Tell me a fun fact about any subject.".to_string()
        } else {
            format!("Tell me a fun fact about {topic}.")
        };
        let messages = [Message::user(prompt)];

        match self.backend.call(ModelRequest::plain(Some(SYSTEM), &messages)).await {
            Ok(response) => {
                let fact = response.message.text().trim().to_string();
                (!fact.is_empty()).then_some(fact)
            }
            Err(e) => {
                warn!(%topic, "fun fact generation failed: {e}");
                None
            }
        }
    }
}

#[async_trait]
impl<B: Backend + 'static> ToolHandler for FunFact<B> {
    async fn invoke(&self, input: &Value) -> Result<ToolOutput, ToolError> {
        let args: Args = parse_args(input).unwrap_or_else(|e| {
            warn!("unusable fun fact arguments, using the default topic: {e}");
            Args::default()
        });
        let topic = args
            .topic
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TOPIC.to_string());

        let fact = self
            .generate(&topic)
            .await
            .unwrap_or_else(|| FALLBACK_FACT.to_string());

        Ok(ToolOutput::with_payload(
            format!("Fun fact: {fact}"),
            json!({ "topic": topic, "fact": fact }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runtime::ModelError;
    use runtime::testing::ScriptedBackend;

    #[tokio::test]
    async fn returns_generated_fact() {
        let backend = Arc::new(ScriptedBackend::new([ScriptedBackend::text(
            "Octopuses have three hearts.",
        )]));
        let output = FunFact::new(backend.clone())
            .invoke(&json!({ "topic": "animals" }))
            .await
            .unwrap();

        assert!(output.succeeded);
        assert_eq!(output.display_text, "Fun fact: Octopuses have three hearts.");
        assert_eq!(output.payload.unwrap()["topic"], "animals");

        let recorded = backend.requests();
        assert_eq!(recorded.len(), 1);
        assert!(recorded[0].tools.is_empty());
        assert!(recorded[0].messages[0].text().contains("animals"));
    }

    #[tokio::test]
    async fn provider_failure_yields_fallback() {
        let backend = Arc::new(ScriptedBackend::new([Err(ModelError::Network(
            "connection reset".into(),
        ))]));
        let output = FunFact::new(backend).invoke(&Value::Null).await.unwrap();

        assert!(output.succeeded);
        let payload = output.payload.unwrap();
        assert_eq!(payload["fact"], FALLBACK_FACT);
        assert_eq!(payload["topic"], "random");
    }

    #[tokio::test]
    async fn malformed_topic_falls_back_to_default() {
        let backend = Arc::new(ScriptedBackend::new([ScriptedBackend::text(
            "Bananas are berries.",
        )]));
        let output = FunFact::new(backend.clone())
            .invoke(&json!({ "topic": 42 }))
            .await
            .unwrap();

        assert!(output.succeeded);
        assert_eq!(output.payload.unwrap()["topic"], "random");
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn empty_reply_yields_fallback() {
        let backend = Arc::new(ScriptedBackend::new([ScriptedBackend::text("   ")]));
        let output = FunFact::new(backend).invoke(&json!({})).await.unwrap();
        assert!(output.succeeded);
        assert!(output.display_text.ends_with(FALLBACK_FACT));
    }
}
