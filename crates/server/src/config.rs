//! Configuration loading from chatbot.toml and the environment.

use lookups::LookupConfig;
use runtime::providers::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const DEFAULT_SYSTEM_PROMPT: &str = "You are a friendly assistant in a web chat. \
Answer in the same language as the user, briefly and clearly. \
When a question needs the current time, the current weather, a historical event for a date \
or a fun fact, call the matching function instead of guessing. \
A function's result arrives in the \"content\" field of its response; base your answer on it. \
If no place or timezone is given for a time question, or the city is in Brazil, \
use America/Sao_Paulo.";

/// Top-level configuration.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    /// Completion-service settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Outbound HTTP settings shared by every provider.
    #[serde(default)]
    pub http: HttpConfig,

    /// `[time]`, `[weather]` and `[history]` provider sections.
    #[serde(flatten)]
    pub lookups: LookupConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Gemini API key.
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    /// Overrides the built-in system instruction.
    pub system: Option<String>,
    pub base_url: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 1024,
            system: None,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Load the file if it exists, otherwise start from defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Override fields from environment variables.
    ///
    /// `var` is the lookup, so callers can pass `std::env::var` or a map.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        let credential = |name: &str| var(name).map(|key| key.trim().to_string());

        if let Some(key) = credential("GEMINI_API_KEY") {
            self.model.api_key = Some(key);
        }
        if let Some(model) = var("CHATBOT_MODEL") {
            self.model.model = model;
        }
        if let Some(key) = credential("OPENWEATHER_API_KEY") {
            self.lookups.weather.api_key = Some(key);
        }
        if let Some(port) = var("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(port))?;
        }
        Ok(())
    }

    /// Drop absent or placeholder credentials, returning a warning for each.
    ///
    /// The server still starts without them: chat calls fail with 401 and
    /// the weather tool reports that it is not configured.
    pub fn normalize_credentials(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();

        let gemini = self
            .model
            .api_key
            .take()
            .map(|k| k.trim().to_string())
            .filter(|k| !is_placeholder(k) && k.len() >= 30);
        if gemini.is_none() {
            warnings.push(
                "GEMINI_API_KEY is missing or a placeholder: the server will run, but chat \
                 requests will fail. Get a key at https://aistudio.google.com/app/apikey"
                    .to_string(),
            );
        }
        self.model.api_key = gemini;

        let weather = self
            .lookups
            .weather
            .api_key
            .take()
            .map(|k| k.trim().to_string())
            .filter(|k| !is_placeholder(k));
        if weather.is_none() {
            warnings.push(
                "OPENWEATHER_API_KEY is missing or a placeholder: the weather tool will report \
                 that it is not configured."
                    .to_string(),
            );
        }
        self.lookups.weather.api_key = weather;

        warnings
    }

    pub fn system_prompt(&self) -> &str {
        self.model.system.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn is_placeholder(key: &str) -> bool {
    let key = key.trim();
    key.is_empty() || key.starts_with("YOUR_") || key.eq_ignore_ascii_case("changeme")
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid PORT value: {0:?}")]
    InvalidPort(String),
}
