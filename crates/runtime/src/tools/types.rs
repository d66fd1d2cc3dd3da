//! Tool-related types.

use super::ToolError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// The closed set of tools the assistant may invoke.
///
/// The wire name is only used when talking to the completion service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    CurrentTime,
    CurrentWeather,
    HistoricalFact,
    FunFact,
}

impl ToolKind {
    pub const ALL: [ToolKind; 4] = [
        Self::CurrentTime,
        Self::CurrentWeather,
        Self::HistoricalFact,
        Self::FunFact,
    ];

    /// Name advertised to the completion service.
    pub fn name(self) -> &'static str {
        match self {
            Self::CurrentTime => "getCurrentTime",
            Self::CurrentWeather => "getCurrentWeather",
            Self::HistoricalFact => "getHistoricalFact",
            Self::FunFact => "getFunFact",
        }
    }

    /// Whether a successful payload is forwarded to the client for rich rendering.
    pub fn is_renderable(self) -> bool {
        matches!(self, Self::CurrentWeather)
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ToolKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| crate::Error::UnknownTool(s.to_string()))
    }
}

/// What a tool invocation produced.
///
/// `display_text` is always present: it is fed back to the model and, on
/// failure, is the user-facing explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    pub display_text: String,
}

impl ToolOutput {
    /// Successful output with text only.
    pub fn success(display_text: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            payload: None,
            display_text: display_text.into(),
        }
    }

    /// Successful output carrying structured data.
    pub fn with_payload(display_text: impl Into<String>, payload: Value) -> Self {
        Self {
            succeeded: true,
            payload: Some(payload),
            display_text: display_text.into(),
        }
    }

    /// Failed output.
    pub fn failure(display_text: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            payload: None,
            display_text: display_text.into(),
        }
    }
}

/// Decode tool arguments, treating a missing (`null`) value as `{}`.
pub fn parse_args<T: DeserializeOwned>(input: &Value) -> Result<T, ToolError> {
    let input = match input {
        Value::Null => Value::Object(Default::default()),
        other => other.clone(),
    };
    serde_json::from_value(input).map_err(|e| ToolError::InvalidInput(e.to_string()))
}
