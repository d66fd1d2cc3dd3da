use thiserror::Error;

/// Errors from completion-service calls.
///
/// Providers classify failures into these variants once, at the adapter
/// boundary, so callers never inspect raw status codes or bodies.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// A network error occurred during the API call.
    #[error("network: {0}")]
    Network(String),

    /// The provider returned an error response.
    #[error("provider api: {0}")]
    Api(String),

    /// The provider response could not be parsed.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    /// The credential is missing, malformed or rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The account ran out of quota.
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    /// The provider refused the prompt on content-policy grounds.
    #[error("blocked: {0}")]
    Blocked(String),
}
