//! `getCurrentTime`: wall-clock time for a timezone.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use runtime::{ToolError, ToolHandler, ToolOutput, parse_args};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

use crate::{Error, Result, http};

pub const DESCRIPTION: &str = "Returns the current date and time for an IANA timezone. \
Use it whenever the user asks what time or day it is somewhere.";

/// Time provider settings (`[time]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// WorldTimeAPI-compatible base URL.
    pub base_url: String,
    pub default_timezone: String,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://worldtimeapi.org/api".to_string(),
            default_timezone: "America/Sao_Paulo".to_string(),
        }
    }
}

pub fn schema(default_timezone: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "timezone": {
                "type": "string",
                "description": format!(
                    "IANA timezone such as \"America/Sao_Paulo\" or \"Europe/Lisbon\". \
                     Defaults to \"{default_timezone}\"."
                )
            }
        }
    })
}

#[derive(Debug, Default, Deserialize)]
struct Args {
    #[serde(default)]
    timezone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiTime {
    datetime: String,
    timezone: String,
}

/// Looks the time up from an external time service.
pub struct CurrentTime {
    client: reqwest::Client,
    config: TimeConfig,
}

impl CurrentTime {
    pub fn new(config: TimeConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http::client(timeout)?,
            config,
        })
    }

    async fn lookup(&self, timezone: &str) -> Result<(String, DateTime<FixedOffset>)> {
        let base = self.config.base_url.trim_end_matches('/');
        let url = http::url(&format!("{base}/timezone/{timezone}"))?;
        let time: ApiTime = http::get_json(&self.client, url).await?;
        let parsed = DateTime::parse_from_rfc3339(&time.datetime)
            .map_err(|e| Error::InvalidResponse(format!("datetime {:?}: {e}", time.datetime)))?;
        Ok((time.timezone, parsed))
    }
}

fn is_valid_timezone(tz: &str) -> bool {
    !tz.is_empty()
        && !tz.contains("..")
        && tz
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '-' | '+'))
}

#[async_trait]
impl ToolHandler for CurrentTime {
    async fn invoke(&self, input: &Value) -> std::result::Result<ToolOutput, ToolError> {
        let args: Args = match parse_args(input) {
            Ok(args) => args,
            Err(e) => {
                warn!("unusable time arguments: {e}");
                return Ok(ToolOutput::failure(
                    "The timezone must be given as a name such as \"America/Sao_Paulo\".",
                ));
            }
        };
        let timezone = args
            .timezone
            .map(|tz| tz.trim().to_string())
            .filter(|tz| !tz.is_empty())
            .unwrap_or_else(|| self.config.default_timezone.clone());

        if !is_valid_timezone(&timezone) {
            return Ok(ToolOutput::failure(format!(
                "\"{timezone}\" is not a valid timezone name."
            )));
        }

        let output = match self.lookup(&timezone).await {
            Ok((zone, now)) => {
                let date = now.format("%d/%m/%Y").to_string();
                let time = now.format("%H:%M:%S").to_string();
                let formatted = format!("{date} {time}");
                ToolOutput::with_payload(
                    format!("It is {time} on {date} in {zone}."),
                    json!({
                        "timezone": zone,
                        "date": date,
                        "time": time,
                        "formatted": formatted,
                    }),
                )
            }
            Err(e) if e.status() == Some(404) => {
                ToolOutput::failure(format!("The timezone \"{timezone}\" is not known."))
            }
            Err(e) => {
                warn!(%timezone, "time lookup failed: {e}");
                ToolOutput::failure(format!(
                    "Sorry, I couldn't get the current time for {timezone} right now."
                ))
            }
        };
        Ok(output)
    }
}
