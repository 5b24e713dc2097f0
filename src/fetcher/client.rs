use crate::config::PipelineConfig;
use crate::fetcher::{charset::process_response, errors::FetchError, types::PageResponse};
use bytes::BytesMut;
use reqwest::{Client, ClientBuilder, StatusCode, header};
use tracing::{debug, instrument};
use url::Url;

/// Single-attempt HTTP GET with a browser-like identity, a redirect cap and a
/// body size cap.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    max_body_bytes: usize,
}

impl HttpFetcher {
    pub fn new(config: &PipelineConfig) -> Result<Self, FetchError> {
        let mut headers = header::HeaderMap::new();
        let accept = header::HeaderValue::from_str(&config.accept)
            .map_err(|e| FetchError::Unknown(format!("invalid accept header: {e}")))?;
        headers.insert(header::ACCEPT, accept);

        let client = ClientBuilder::new()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .default_headers(headers)
            .build()
            .map_err(|e| FetchError::Unknown(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }

    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch(&self, url: &str) -> Result<PageResponse, FetchError> {
        let parsed_url = Url::parse(url)?;
        if !matches!(parsed_url.scheme(), "http" | "https") {
            return Err(FetchError::UnsupportedScheme(parsed_url.scheme().to_string()));
        }

        let mut response = self
            .client
            .get(parsed_url)
            .send()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        let final_url = response.url().clone();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        if is_failure_status(status) {
            return Err(FetchError::Http(status));
        }

        // Read at most `max_body_bytes`, dropping the rest.
        let mut body = BytesMut::new();
        let mut truncated = false;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(FetchError::from_reqwest_error)?
        {
            let remaining = self.max_body_bytes - body.len();
            if chunk.len() > remaining {
                body.extend_from_slice(&chunk[..remaining]);
                truncated = true;
                break;
            }
            body.extend_from_slice(&chunk);
        }

        debug!(
            status = %status,
            final_url = %final_url,
            size = body.len(),
            truncated,
            "fetched page"
        );

        Ok(process_response(
            final_url,
            status,
            content_type.as_deref(),
            body.freeze(),
            truncated,
        ))
    }
}

/// Any status from 400 up, including non-standard codes past 599.
fn is_failure_status(status: StatusCode) -> bool {
    status.as_u16() >= 400
}
