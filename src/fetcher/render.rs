use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("render request failed: {0}")]
    Request(String),

    #[error("renderer returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("renderer returned an empty document")]
    Empty,
}

/// Renders a page in a browser engine and returns the resulting HTML.
///
/// Implementations must not submit forms or click anything; navigating to
/// the URL and reading the settled DOM is all the pipeline needs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RenderFetcher: Send + Sync {
    async fn render(&self, url: &str) -> Result<String, RenderError>;
}

#[derive(Serialize)]
struct RenderRequest<'a> {
    url: &'a str,
}

/// Client for a rendering service that accepts `POST {"url": ...}` and
/// answers with the rendered HTML (the browserless `/content` contract).
#[derive(Debug, Clone)]
pub struct RemoteRenderer {
    client: Client,
    endpoint: String,
}

impl RemoteRenderer {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl RenderFetcher for RemoteRenderer {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn render(&self, url: &str) -> Result<String, RenderError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&RenderRequest { url })
            .send()
            .await
            .map_err(|e| RenderError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Status(status));
        }

        let html = response
            .text()
            .await
            .map_err(|e| RenderError::Request(e.to_string()))?;

        if html.trim().is_empty() {
            return Err(RenderError::Empty);
        }

        Ok(html)
    }
}
