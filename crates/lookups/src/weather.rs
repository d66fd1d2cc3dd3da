//! `getCurrentWeather`: current conditions for a city.

use std::time::Duration;

use async_trait::async_trait;
use runtime::{ToolError, ToolHandler, ToolOutput, parse_args};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::warn;

use crate::{Error, Result, http};

pub const DESCRIPTION: &str = "Returns the current weather (description, temperature, \
humidity, wind) for a city. Use it whenever the user asks about weather or temperature.";

pub const NOT_CONFIGURED_TEXT: &str =
    "The weather service is not configured: no API key is set on the server.";

/// Weather provider settings (`[weather]`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    /// OpenWeatherMap-compatible base URL.
    pub base_url: String,
    /// `metric`, `imperial` or `standard`.
    pub units: String,
    pub language: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openweathermap.org".to_string(),
            units: "metric".to_string(),
            language: "pt_br".to_string(),
        }
    }
}

pub fn schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "location": {
                "type": "string",
                "description": "City name, optionally with a country code, e.g. \"Curitiba\" or \"Curitiba, BR\"."
            }
        },
        "required": ["location"]
    })
}

#[derive(Debug, Default, Deserialize)]
struct Args {
    #[serde(default)]
    location: String,
}

#[derive(Debug, Deserialize)]
struct ApiWeather {
    name: String,
    #[serde(default)]
    sys: ApiSys,
    #[serde(default)]
    weather: Vec<ApiCondition>,
    main: ApiMain,
    #[serde(default)]
    wind: ApiWind,
}

#[derive(Debug, Default, Deserialize)]
struct ApiSys {
    #[serde(default)]
    country: String,
}

#[derive(Debug, Deserialize)]
struct ApiCondition {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct ApiMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Default, Deserialize)]
struct ApiWind {
    #[serde(default)]
    speed: f64,
}

/// Structured weather data handed to the client for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    pub location_name: String,
    pub country: String,
    pub description: String,
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub icon_id: String,
}

impl From<ApiWeather> for WeatherReport {
    fn from(api: ApiWeather) -> Self {
        let (description, icon_id) = api
            .weather
            .into_iter()
            .next()
            .map(|c| (c.description, c.icon))
            .unwrap_or_default();
        Self {
            location_name: api.name,
            country: api.sys.country,
            description,
            temperature: api.main.temp,
            humidity: api.main.humidity,
            wind_speed: api.wind.speed,
            icon_id,
        }
    }
}

/// Looks conditions up from an OpenWeatherMap-compatible service.
pub struct CurrentWeather {
    client: reqwest::Client,
    config: WeatherConfig,
}

impl CurrentWeather {
    pub fn new(config: WeatherConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http::client(timeout)?,
            config,
        })
    }

    fn units(&self) -> (&'static str, &'static str) {
        match self.config.units.as_str() {
            "imperial" => ("°F", "mph"),
            "standard" => ("K", "m/s"),
            _ => ("°C", "m/s"),
        }
    }

    async fn lookup(&self, api_key: &str, location: &str) -> Result<WeatherReport> {
        let base = self.config.base_url.trim_end_matches('/');
        let url = http::url_with_params(
            &format!("{base}/data/2.5/weather"),
            &[
                ("q", location),
                ("appid", api_key),
                ("units", &self.config.units),
                ("lang", &self.config.language),
            ],
        )?;
        let api: ApiWeather = http::get_json(&self.client, url).await?;
        Ok(api.into())
    }

    fn describe(&self, report: &WeatherReport) -> String {
        let (temp_unit, speed_unit) = self.units();
        let place = if report.country.is_empty() {
            report.location_name.clone()
        } else {
            format!("{}, {}", report.location_name, report.country)
        };
        format!(
            "Weather in {place}: {}, {:.1}{temp_unit}, humidity {:.0}%, wind {:.1} {speed_unit}.",
            report.description, report.temperature, report.humidity, report.wind_speed
        )
    }
}

#[async_trait]
impl ToolHandler for CurrentWeather {
    async fn invoke(&self, input: &Value) -> std::result::Result<ToolOutput, ToolError> {
        let Some(api_key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) else {
            return Ok(ToolOutput::failure(NOT_CONFIGURED_TEXT));
        };

        let args: Args = parse_args(input)?;
        let location = args.location.trim();
        if location.is_empty() {
            return Ok(ToolOutput::failure(
                "Please tell me which city you want the weather for.",
            ));
        }

        let output = match self.lookup(api_key, location).await {
            Ok(report) => {
                let text = self.describe(&report);
                let payload = serde_json::to_value(&report)
                    .map_err(|e| ToolError::Execution(e.to_string()))?;
                ToolOutput::with_payload(text, payload)
            }
            Err(Error::Status { status: 404, .. }) => ToolOutput::failure(format!(
                "I couldn't find a city called \"{location}\". Try \"City, CountryCode\"."
            )),
            Err(Error::Status { status: 401, .. }) => ToolOutput::failure(
                "The weather service rejected the configured API key.",
            ),
            Err(e) => {
                warn!(%location, "weather lookup failed: {e}");
                ToolOutput::failure(format!(
                    "Sorry, I couldn't get the weather for {location} right now."
                ))
            }
        };
        Ok(output)
    }
}
