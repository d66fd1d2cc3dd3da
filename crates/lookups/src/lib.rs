//! Auxiliary lookup tools for the chatbot.
//!
//! Each tool wraps one external data provider and turns every provider
//! failure into a failed [`runtime::ToolOutput`] instead of an error:
//!
//! - [`CurrentTime`]: wall-clock time via a WorldTimeAPI-style service
//! - [`CurrentWeather`]: conditions via an OpenWeatherMap-style service
//! - [`HistoricalFact`]: an "on this day" event via the Wikimedia feed
//! - [`FunFact`]: trivia from the completion service itself
//!
//! [`registry`] builds a [`runtime::ToolRegistry`] with all four.

mod catalog;
mod error;
pub mod fun_fact;
pub mod history;
mod http;
pub mod time;
pub mod weather;

pub use catalog::{LookupConfig, registry};
pub use error::{Error, Result};
pub use fun_fact::FunFact;
pub use history::{HistoricalFact, HistoryConfig};
pub use time::{CurrentTime, TimeConfig};
pub use weather::{CurrentWeather, WeatherConfig, WeatherReport};
