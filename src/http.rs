//! Shared HTTP client for all source adapters.

use crate::error::{ConfigError, SourceError};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

/// Build the client every adapter shares: one User-Agent, one timeout.
pub fn build_client(user_agent: &str, timeout: Duration) -> Result<Client, ConfigError> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()
        .map_err(|e| ConfigError::Http(e.to_string()))
}

/// GET `url` and return the body text.
///
/// Transport failures, timeouts and non-success statuses all map to a
/// network-class [`SourceError`].
#[instrument(level = "info", skip(client))]
pub async fn get_text(client: &Client, url: &str) -> Result<String, SourceError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| SourceError::Request {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.text().await.map_err(|e| SourceError::Request {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    debug!(bytes = body.len(), "Fetched body");
    Ok(body)
}
