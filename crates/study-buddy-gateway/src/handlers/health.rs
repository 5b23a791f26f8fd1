//! Health check endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::GatewayState;
use crate::upstream::CompletionUpstream;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Whether an upstream API key is set; chats fail without one.
    pub upstream_configured: bool,
    /// Whether callers must present a client key.
    pub client_key_required: bool,
}

/// Health check handler.
///
/// Public; does not require a client key. Never reveals the keys themselves.
///
/// ```text
/// GET /health
///
/// 200 OK
/// { "status": "healthy", "version": "0.1.0",
///   "upstream_configured": true, "client_key_required": false }
/// ```
pub async fn health<U>(State(state): State<Arc<GatewayState<U>>>) -> Json<HealthResponse>
where
    U: CompletionUpstream + 'static,
{
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        upstream_configured: state.config.upstream.api_key.is_some(),
        client_key_required: state.config.requires_client_key(),
    })
}
