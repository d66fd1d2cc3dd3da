use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

/// Body of every error reply: `{ "error": "<message>" }`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// An HTTP error reply.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<runtime::Error> for ApiError {
    fn from(err: runtime::Error) -> Self {
        use runtime::Error;

        match err {
            Error::EmptyMessage | Error::Blocked(_) => {
                Self::new(StatusCode::BAD_REQUEST, err.to_string())
            }
            Error::Unauthorized(_) => Self::new(
                StatusCode::UNAUTHORIZED,
                "The completion service API key is invalid or not configured.",
            ),
            Error::QuotaExceeded(_) => Self::new(
                StatusCode::TOO_MANY_REQUESTS,
                "The completion service quota was exceeded. Check your plan or limits.",
            ),
            other => {
                error!("unclassified failure: {other}");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error while processing the message.",
                )
            }
        }
    }
}
