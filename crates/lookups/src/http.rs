//! Shared HTTP plumbing for provider calls.

use std::time::Duration;

use reqwest::Url;
use serde::de::DeserializeOwned;

use crate::{Error, Result};

const USER_AGENT: &str = concat!("chatbot/", env!("CARGO_PKG_VERSION"));

/// Build a client with the given per-request timeout.
pub(crate) fn client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| Error::Client(e.to_string()))
}

pub(crate) fn url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| Error::Url(format!("{raw}: {e}")))
}

pub(crate) fn url_with_params(raw: &str, params: &[(&str, &str)]) -> Result<Url> {
    Url::parse_with_params(raw, params).map_err(|e| Error::Url(format!("{raw}: {e}")))
}

/// GET a JSON document, mapping non-2xx replies to [`Error::Status`].
pub(crate) async fn get_json<T: DeserializeOwned>(client: &reqwest::Client, url: Url) -> Result<T> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Error::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Status {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json()
        .await
        .map_err(|e| Error::InvalidResponse(e.to_string()))
}
