//! Study Buddy Gateway - tutor chat proxy
//!
//! This is the main entry point for the gateway service.
//!
//! # Configuration
//!
//! - `LISTEN_ADDR` - bind address (default `0.0.0.0:8080`)
//! - `UPSTREAM_URL`, `UPSTREAM_MODEL` - chat-completions endpoint and model
//! - `UPSTREAM_API_KEY` - bearer key for the upstream (required to serve chats)
//! - `CLIENT_KEYS` - comma-separated keys clients must present; open if unset
//! - `CORS_ORIGINS` - comma-separated allowed origins (default `*`)

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use study_buddy_gateway::{create_router, GatewayConfig, GatewayState, HttpUpstream};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,study_buddy=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Study Buddy Gateway");

    let config = GatewayConfig::from_env();
    tracing::info!(
        listen_addr = %config.listen_addr,
        upstream_url = %config.upstream.url,
        model = %config.upstream.model,
        cors_origins = ?config.cors_origins,
        "Gateway configuration loaded"
    );

    if config.upstream.api_key.is_none() {
        tracing::warn!("No UPSTREAM_API_KEY set - chat requests will fail");
    }
    if config.requires_client_key() {
        tracing::info!(keys = config.client_keys.len(), "Client keys required");
    } else {
        tracing::warn!("No CLIENT_KEYS set - gateway is open to any caller");
    }

    let upstream = Arc::new(HttpUpstream::new(config.upstream.clone())?);
    let listen_addr = config.listen_addr.clone();
    let app = create_router(GatewayState::new(upstream, config));

    // Start HTTP server
    tracing::info!(listen_addr = %listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
