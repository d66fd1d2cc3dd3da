//! `getHistoricalFact`: a notable event that happened on a calendar date.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, Local, NaiveDate};
use rand::seq::IndexedRandom;
use runtime::{ToolError, ToolHandler, ToolOutput, parse_args};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

use crate::{Result, http};

pub const DESCRIPTION: &str = "Returns one notable historical event that happened on a given \
calendar day (any year). Use it when the user asks what happened on a date or for a history fact.";

/// "On this day" provider settings (`[history]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Wikimedia-feed-compatible base URL.
    pub base_url: String,
    /// Wikipedia language edition.
    pub language: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.wikimedia.org".to_string(),
            language: "pt".to_string(),
        }
    }
}

pub fn schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "date": {
                "type": "string",
                "description": "Calendar day as MM-DD, e.g. \"04-22\". Defaults to today."
            }
        }
    })
}

#[derive(Debug, Default, Deserialize)]
struct Args {
    #[serde(default)]
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiFeed {
    #[serde(default)]
    events: Vec<ApiEvent>,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiEvent {
    text: String,
    #[serde(default)]
    year: Option<i32>,
}

/// A month/day pair, validated against a leap year so `02-29` is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MonthDay {
    month: u32,
    day: u32,
}

impl MonthDay {
    fn today() -> Self {
        let now = Local::now();
        Self {
            month: now.month(),
            day: now.day(),
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        let (month, day) = raw.trim().split_once('-')?;
        if month.len() != 2 || day.len() != 2 {
            return None;
        }
        let month: u32 = month.parse().ok()?;
        let day: u32 = day.parse().ok()?;
        NaiveDate::from_ymd_opt(2000, month, day)?;
        Some(Self { month, day })
    }
}

impl std::fmt::Display for MonthDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

/// Picks one event for a date from a Wikimedia "on this day" feed.
pub struct HistoricalFact {
    client: reqwest::Client,
    config: HistoryConfig,
}

impl HistoricalFact {
    pub fn new(config: HistoryConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http::client(timeout)?,
            config,
        })
    }

    async fn events(&self, date: MonthDay) -> Result<Vec<ApiEvent>> {
        let base = self.config.base_url.trim_end_matches('/');
        let url = http::url(&format!(
            "{base}/feed/v1/wikipedia/{}/onthisday/events/{:02}/{:02}",
            self.config.language, date.month, date.day
        ))?;
        let feed: ApiFeed = http::get_json(&self.client, url).await?;
        Ok(feed.events)
    }
}

#[async_trait]
impl ToolHandler for HistoricalFact {
    async fn invoke(&self, input: &Value) -> std::result::Result<ToolOutput, ToolError> {
        let args: Args = parse_args(input)?;
        let date = match args.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            None => MonthDay::today(),
            Some(raw) => match MonthDay::parse(raw) {
                Some(date) => date,
                None => {
                    return Ok(ToolOutput::failure(format!(
                        "\"{raw}\" is not a valid date; use MM-DD, e.g. 04-22."
                    )));
                }
            },
        };

        let events = match self.events(date).await {
            Ok(events) => events,
            Err(e) => {
                warn!(%date, "history lookup failed: {e}");
                return Ok(ToolOutput::failure(format!(
                    "Sorry, I couldn't look up historical events for {date} right now."
                )));
            }
        };

        let Some(event) = events.choose(&mut rand::rng()) else {
            return Ok(ToolOutput::failure(format!("No event found for {date}.")));
        };

        let text = match event.year {
            Some(year) => format!("On {date} in {year}: {}", event.text),
            None => format!("On {date}: {}", event.text),
        };
        Ok(ToolOutput::with_payload(
            text,
            json!({
                "date": date.to_string(),
                "year": event.year,
                "text": event.text,
            }),
        ))
    }
}
