use crate::error::{ChannelError, Result};
use reqwest::{Client, ClientBuilder, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Builds the client a provider uses for every request. `timeout` bounds the
/// whole exchange, connect included.
pub fn build_client(timeout: Duration) -> Result<Client> {
    ClientBuilder::new()
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .build()
        .map_err(|e| ChannelError::ConfigError(format!("failed to build HTTP client: {e}")))
}

/// Sends the request and decodes a JSON answer.
///
/// Network failures, timeouts and non-2xx statuses surface as
/// [`ChannelError::TransportError`]; a body that is not the expected JSON as
/// [`ChannelError::DecodeError`].
pub async fn send_json<T: DeserializeOwned>(request: RequestBuilder, provider: &str) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|e| transport(provider, &e))?;

    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| transport(provider, &e))?;

    tracing::debug!(
        provider,
        status = status.as_u16(),
        body = %String::from_utf8_lossy(&body),
        "Provider response"
    );

    if !status.is_success() {
        return Err(ChannelError::TransportError(format!(
            "{provider} answered HTTP {status}"
        )));
    }

    serde_json::from_slice(&body)
        .map_err(|e| ChannelError::DecodeError(format!("{provider} response: {e}")))
}

fn transport(provider: &str, err: &reqwest::Error) -> ChannelError {
    if err.is_timeout() {
        ChannelError::TransportError(format!("{provider} request timed out"))
    } else {
        ChannelError::TransportError(format!("{provider} request failed: {err}"))
    }
}
