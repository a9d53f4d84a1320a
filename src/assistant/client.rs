//! Upstream LLM client

use super::messages::{MessageRequest, MessageResponse};
use crate::error::UpstreamError;
use async_trait::async_trait;
use reqwest::Client;
use std::error::Error as _;
use std::time::Duration;
use tracing::{debug, error};

pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_API_VERSION: &str = "2023-06-01";

/// Sends one message request to the upstream model
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn send(&self, request: &MessageRequest) -> Result<MessageResponse, UpstreamError>;
}

/// Client for the Anthropic messages API
pub struct AnthropicClient {
    client: Client,
    api_url: String,
    api_version: String,
    api_key: Option<String>,
}

impl AnthropicClient {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            api_url: DEFAULT_API_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            api_key,
        })
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn send(&self, request: &MessageRequest) -> Result<MessageResponse, UpstreamError> {
        debug!("Calling upstream model {}", request.model);

        // Without a key the upstream rejects the call with 401
        let response = self
            .client
            .post(&self.api_url)
            .header("content-type", "application/json")
            .header("x-api-key", self.api_key.as_deref().unwrap_or_default())
            .header("anthropic-version", &self.api_version)
            .json(request)
            .send()
            .await
            .map_err(classify)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Upstream API error: {} - {}", status, body);
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<MessageResponse>()
            .await
            .map_err(|e| UpstreamError::InvalidResponse(e.to_string()))
    }
}

/// Map a transport failure, singling out connection resets
fn classify(err: reqwest::Error) -> UpstreamError {
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::ConnectionReset {
                return UpstreamError::ConnectionReset(err.to_string());
            }
        }
        source = cause.source();
    }
    UpstreamError::Transport(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_defaults() {
        let client = AnthropicClient::new(Some("key".into()), Duration::from_secs(5)).unwrap();
        assert!(client.is_configured());
        assert_eq!(client.api_url, DEFAULT_API_URL);
        assert_eq!(client.api_version, DEFAULT_API_VERSION);
    }

    #[test]
    fn test_client_overrides() {
        let client = AnthropicClient::new(None, Duration::from_secs(5))
            .unwrap()
            .with_api_url("http://localhost:9999/v1/messages")
            .with_api_version("2024-01-01");
        assert!(!client.is_configured());
        assert_eq!(client.api_url, "http://localhost:9999/v1/messages");
        assert_eq!(client.api_version, "2024-01-01");
    }
}
