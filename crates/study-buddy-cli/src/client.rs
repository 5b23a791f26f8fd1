//! HTTP client for the study-buddy gateway.

use reqwest::{Client, RequestBuilder, Response, StatusCode};

use crate::error::ClientError;
use crate::types::{
    ApiErrorResponse, ChatRequest, ExplainRequest, ExplainResponse, HealthStatus,
};

/// Client for the gateway's chat and explain endpoints.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ChatClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the gateway (e.g., "http://localhost:8080")
    /// * `token` - Bearer key the gateway expects, if it requires one
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        }
    }

    /// Gateway URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether requests carry a bearer key.
    #[must_use]
    pub const fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Map a non-success response to an error.
    async fn handle_error(response: Response) -> ClientError {
        let status = response.status();
        match status {
            StatusCode::NOT_FOUND => ClientError::NotDeployed,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Unauthorized,
            StatusCode::TOO_MANY_REQUESTS => ClientError::RateLimited,
            StatusCode::PAYMENT_REQUIRED => ClientError::QuotaExceeded,
            _ => {
                let message = match response.json::<ApiErrorResponse>().await {
                    Ok(body) => body.error.message,
                    Err(_) => "Unknown error".to_string(),
                };
                ClientError::Upstream {
                    status: status.as_u16(),
                    message,
                }
            }
        }
    }

    /// Start a chat turn and return the streaming response.
    ///
    /// The body is not read here; hand it to [`crate::stream::spawn_stream`].
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the gateway answers with a
    /// non-success status, or the response is known to be empty.
    pub async fn open_stream(&self, request: &ChatRequest) -> Result<Response, ClientError> {
        let url = format!("{}/v1/chat", self.base_url);
        tracing::debug!(url = %url, turns = request.messages.len(), "Opening chat stream");

        let response = self
            .authorized(self.client.post(&url))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let err = Self::handle_error(response).await;
            tracing::warn!(error = %err, "Chat request rejected");
            return Err(err);
        }

        if response.content_length() == Some(0) {
            return Err(ClientError::NoBody);
        }

        Ok(response)
    }

    /// Ask for a one-shot explanation of a topic.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the gateway answers with a
    /// non-success status or an unreadable body.
    pub async fn explain(&self, request: &ExplainRequest) -> Result<String, ClientError> {
        let url = format!("{}/v1/explain", self.base_url);
        tracing::debug!(url = %url, topic = %request.topic, "Requesting explanation");

        let response = self
            .authorized(self.client.post(&url))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::handle_error(response).await);
        }

        let body: ExplainResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))?;

        Ok(body.result)
    }

    /// Check that the gateway is reachable and report its setup.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway cannot be reached or answers with a
    /// non-success status or an unreadable body.
    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        let url = format!("{}/health", self.base_url);
        tracing::debug!(url = %url, "Checking gateway health");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(Self::handle_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slash() {
        let client = ChatClient::new("http://localhost:8080/", None);
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn empty_token_is_no_token() {
        let client = ChatClient::new("http://localhost:8080", Some(String::new()));
        assert!(client.token.is_none());
    }
}
