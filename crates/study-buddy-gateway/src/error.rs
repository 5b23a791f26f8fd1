//! API error types and responses.
//!
//! Every failure leaves the gateway as `{ "error": { "code", "message" } }`.
//! Messages are written for learners: the front-end shows them in the chat.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use study_buddy_stream::StreamError;

use crate::upstream::UpstreamError;

/// API error type that implements `IntoResponse`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or unknown client key.
    #[error("missing or invalid client key")]
    Unauthorized,

    /// Invalid request body.
    #[error("{0}")]
    BadRequest(String),

    /// The upstream asked us to slow down.
    #[error("Too many requests. Please wait a moment and try again.")]
    RateLimited,

    /// The upstream account ran out of credits.
    #[error("AI usage limit reached. Please add credits to continue.")]
    QuotaExceeded,

    /// The upstream failed in some other way.
    #[error("AI gateway error")]
    Upstream,

    /// Internal server error.
    #[error("{0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

/// Error details.
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::QuotaExceeded => StatusCode::PAYMENT_REQUIRED,
            Self::Upstream | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::BadRequest(_) => "bad_request",
            Self::RateLimited => "rate_limited",
            Self::QuotaExceeded => "quota_exceeded",
            Self::Upstream => "upstream_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::RateLimited => Self::RateLimited,
            UpstreamError::QuotaExceeded => Self::QuotaExceeded,
            UpstreamError::Status { status, ref body } => {
                tracing::error!(status, body = %body, "Upstream returned an error");
                Self::Upstream
            }
            UpstreamError::Transport(ref msg) => {
                tracing::error!(error = %msg, "Upstream unreachable");
                Self::Upstream
            }
            UpstreamError::MissingApiKey => {
                tracing::error!("Upstream API key is not configured");
                Self::Internal("upstream API key is not configured".to_string())
            }
        }
    }
}

impl From<StreamError> for ApiError {
    fn from(err: StreamError) -> Self {
        tracing::error!(error = %err, "Upstream stream failed");
        Self::Upstream
    }
}
