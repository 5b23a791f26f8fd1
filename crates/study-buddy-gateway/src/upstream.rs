//! Upstream chat-completions client.
//!
//! The gateway talks to an OpenAI-compatible endpoint and always asks for a
//! streamed response. [`CompletionUpstream`] is the seam handlers depend on;
//! [`HttpUpstream`] is the production implementation.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

use crate::config::UpstreamConfig;
use crate::prompt::PromptMessage;

/// Raw response body of a streamed completion.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, UpstreamError>> + Send>>;

/// Errors from the upstream LLM gateway.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// HTTP 429.
    #[error("upstream rate limited")]
    RateLimited,

    /// HTTP 402.
    #[error("upstream quota exceeded")]
    QuotaExceeded,

    /// Any other non-success status.
    #[error("upstream returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for the logs.
        body: String,
    },

    /// The request or the body stream failed.
    #[error("upstream transport error: {0}")]
    Transport(String),

    /// No API key configured.
    #[error("upstream API key is not configured")]
    MissingApiKey,
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Something that can stream chat completions.
#[async_trait]
pub trait CompletionUpstream: Send + Sync {
    /// Start a streamed completion for `messages` (system prompt first).
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent or the upstream
    /// answers with a non-success status.
    async fn stream_completion(&self, messages: Vec<PromptMessage>)
        -> Result<ByteStream, UpstreamError>;
}

/// Request body sent upstream.
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    stream: bool,
    temperature: f32,
    top_p: f32,
}

/// Chat-completions client over HTTP.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    config: UpstreamConfig,
}

impl HttpUpstream {
    /// Create a client for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: UpstreamConfig) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl CompletionUpstream for HttpUpstream {
    async fn stream_completion(
        &self,
        messages: Vec<PromptMessage>,
    ) -> Result<ByteStream, UpstreamError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(UpstreamError::MissingApiKey)?;

        let request = CompletionRequest {
            model: &self.config.model,
            messages: &messages,
            stream: true,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
        };

        tracing::debug!(
            model = %self.config.model,
            messages = messages.len(),
            "Requesting streamed completion"
        );

        let response = self
            .client
            .post(&self.config.url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => UpstreamError::RateLimited,
                StatusCode::PAYMENT_REQUIRED => UpstreamError::QuotaExceeded,
                _ => UpstreamError::Status {
                    status: status.as_u16(),
                    body: response.text().await.unwrap_or_default(),
                },
            });
        }

        Ok(Box::pin(
            response.bytes_stream().map(|chunk| chunk.map_err(UpstreamError::from)),
        ))
    }
}
