use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;
use url::Url;

use super::Origin;
use crate::error::FetchError;

/// reqwest-backed [`Origin`].
///
/// One client is built at startup and shared by every request so that
/// connections are pooled.
#[derive(Debug, Clone)]
pub struct HttpOrigin {
    client: reqwest::Client,
}

impl HttpOrigin {
    /// Build an origin client.
    ///
    /// `timeout` bounds a whole fetch; `None` keeps the transport default.
    pub fn new(timeout: Option<Duration>) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("thumb-streamer/", env!("CARGO_PKG_VERSION")));

        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| FetchError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Origin for HttpOrigin {
    async fn fetch(&self, url: &Url) -> Result<Bytes, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            debug!(url = %url, status = status.as_u16(), "Origin returned non-success status");
            return Err(FetchError::UpstreamStatus(status.as_u16()));
        }

        response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(format!("Failed to read body: {}", e)))
    }
}
