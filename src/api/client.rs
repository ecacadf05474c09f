use crate::api::models::{ChatRequest, HealthReport};
use crate::error::{ChatError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use std::pin::Pin;
use tracing::debug;

/// Raw response body, chunk by chunk, as the network delivers it.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// The seam between the session engine and the agent service.
///
/// `open_stream` must resolve only once the response status is known: a
/// non-2xx status is reported as [`ChatError::HttpStatus`] and no body is
/// returned.
#[async_trait]
pub trait ChatTransport: Send + Sync + 'static {
    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream>;

    async fn health(&self) -> Result<HealthReport>;
}

/// `ChatTransport` over HTTP, talking to the local agent daemon.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn open_stream(&self, request: &ChatRequest) -> Result<ByteStream> {
        let url = self.endpoint("/chat/stream");
        debug!(%url, messages = request.messages.len(), "posting chat request");

        let response = self.client.post(&url).json(request).send().await?;
        let status = response.status();
        debug!(%status, "chat stream response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                body
            };
            return Err(ChatError::HttpStatus {
                status: status.as_u16(),
                message,
            });
        }

        Ok(Box::pin(
            response.bytes_stream().map(|chunk| chunk.map_err(ChatError::from)),
        ))
    }

    async fn health(&self) -> Result<HealthReport> {
        let url = self.endpoint("/health");
        let report = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<HealthReport>()
            .await?;
        debug!(status = %report.status, agent_ready = report.agent_ready, "health check");
        Ok(report)
    }
}
