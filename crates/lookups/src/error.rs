//! Lookup error types.

use thiserror::Error;

/// Failures talking to an external data provider.
///
/// These never leave a tool: each tool turns them into a failed
/// [`runtime::ToolOutput`] with a user-facing explanation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The request could not be sent or timed out.
    #[error("network: {0}")]
    Network(String),

    /// The provider answered with a non-success status.
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The provider body could not be decoded.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    /// A provider URL could not be built.
    #[error("invalid url: {0}")]
    Url(String),

    /// The HTTP client could not be constructed.
    #[error("http client: {0}")]
    Client(String),

    /// The tool catalog could not be assembled.
    #[error(transparent)]
    Registry(#[from] runtime::Error),
}

impl Error {
    /// HTTP status reported by the provider, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
