use crate::model::ModelError;
use thiserror::Error;

/// Turn-level errors, as surfaced to the transport layer.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no message received")]
    EmptyMessage,

    #[error("message blocked: {0}")]
    Blocked(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("tool already registered: {0}")]
    DuplicateTool(String),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error(transparent)]
    Model(ModelError),
}

impl From<ModelError> for Error {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Blocked(reason) => Self::Blocked(reason),
            ModelError::Unauthorized(msg) => Self::Unauthorized(msg),
            ModelError::QuotaExceeded(msg) => Self::QuotaExceeded(msg),
            other => Self::Model(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
