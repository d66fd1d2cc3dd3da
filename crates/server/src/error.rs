//! Startup and CLI error types.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that stop the `chatbot` binary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration is unreadable or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The completion-service client could not be built.
    #[error(transparent)]
    Model(#[from] runtime::ModelError),

    /// A turn failed (only surfaced by `chatbot ask`).
    #[error(transparent)]
    Runtime(#[from] runtime::Error),

    /// The tool catalog could not be built.
    #[error(transparent)]
    Lookups(#[from] lookups::Error),

    /// Binding or serving failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
