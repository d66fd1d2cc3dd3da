//! Assembles the reference tool catalog.

use std::sync::Arc;
use std::time::Duration;

use runtime::{Backend, Tool, ToolKind, ToolRegistry};
use serde::Deserialize;

use crate::fun_fact::{self, FunFact};
use crate::history::{self, HistoricalFact, HistoryConfig};
use crate::time::{self, CurrentTime, TimeConfig};
use crate::weather::{self, CurrentWeather, WeatherConfig};
use crate::Result;

/// Settings for every external provider, one section each.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LookupConfig {
    #[serde(default)]
    pub time: TimeConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

/// Build the registry with all four tools.
///
/// `backend` drives `getFunFact`; `timeout` bounds every provider request.
pub fn registry<B: Backend + 'static>(
    config: &LookupConfig,
    backend: Arc<B>,
    timeout: Duration,
) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();

    registry.register(Tool::new(
        ToolKind::CurrentTime,
        time::DESCRIPTION,
        time::schema(&config.time.default_timezone),
        Arc::new(CurrentTime::new(config.time.clone(), timeout)?),
    ))?;
    registry.register(Tool::new(
        ToolKind::CurrentWeather,
        weather::DESCRIPTION,
        weather::schema(),
        Arc::new(CurrentWeather::new(config.weather.clone(), timeout)?),
    ))?;
    registry.register(Tool::new(
        ToolKind::HistoricalFact,
        history::DESCRIPTION,
        history::schema(),
        Arc::new(HistoricalFact::new(config.history.clone(), timeout)?),
    ))?;
    registry.register(Tool::new(
        ToolKind::FunFact,
        fun_fact::DESCRIPTION,
        fun_fact::schema(),
        Arc::new(FunFact::new(backend)),
    ))?;

    Ok(registry)
}
