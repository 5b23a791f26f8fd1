//! Client key authentication.
//!
//! When client keys are configured, every API request must carry
//! `Authorization: Bearer <key>` with one of them. Callers are identified in
//! logs by a fingerprint of their key, never by the key itself.

use std::fmt;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use study_buddy_core::ClientFingerprint;

use crate::error::ApiError;
use crate::state::GatewayState;
use crate::upstream::CompletionUpstream;

/// The caller of an API request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    /// The gateway runs without client keys.
    Anonymous,
    /// A caller holding a configured key.
    Client(ClientFingerprint),
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("anonymous"),
            Self::Client(fingerprint) => write!(f, "{fingerprint}"),
        }
    }
}

/// Extract the bearer token from request headers.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Check a request against the configured keys.
///
/// # Errors
///
/// Returns [`ApiError::Unauthorized`] if keys are configured and the request
/// carries none of them.
pub fn authorize(headers: &HeaderMap, client_keys: &[String]) -> Result<Caller, ApiError> {
    if client_keys.is_empty() {
        return Ok(Caller::Anonymous);
    }

    let token = bearer_token(headers).ok_or(ApiError::Unauthorized)?;
    if client_keys.iter().any(|key| key == token) {
        Ok(Caller::Client(ClientFingerprint::from_token(token)))
    } else {
        tracing::warn!(
            fingerprint = %ClientFingerprint::from_token(token),
            "Rejected unknown client key"
        );
        Err(ApiError::Unauthorized)
    }
}

#[async_trait]
impl<U> FromRequestParts<Arc<GatewayState<U>>> for Caller
where
    U: CompletionUpstream + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<GatewayState<U>>,
    ) -> Result<Self, Self::Rejection> {
        authorize(&parts.headers, &state.config.client_keys)
    }
}
