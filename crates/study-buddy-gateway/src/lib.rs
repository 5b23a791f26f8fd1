//! HTTP gateway for the study-buddy tutor.
//!
//! The gateway is a thin proxy in front of a hosted LLM. It:
//!
//! - Validates chat requests and builds the tutor system prompt
//! - Streams upstream completions back to the client byte for byte
//! - Maps upstream failures to learner-facing error messages
//! - Optionally requires a client key
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Front-ends (browser / CLI)                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │  POST /v1/chat
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    study-buddy-gateway                       │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────────┐   │
//! │  │ Client key  │ │   Router    │ │   System prompt     │   │
//! │  │  Extractor  │ │  + Handlers │ │   builder           │   │
//! │  └─────────────┘ └─────────────┘ └─────────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │  text/event-stream
//!                              ▼
//!                   ┌─────────────────────┐
//!                   │  Upstream LLM       │
//!                   │  chat/completions   │
//!                   └─────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use study_buddy_gateway::{create_router, GatewayConfig, GatewayState, HttpUpstream};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GatewayConfig::from_env();
//! let upstream = Arc::new(HttpUpstream::new(config.upstream.clone())?);
//! let app = create_router(GatewayState::new(upstream, config));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod prompt;
pub mod routes;
pub mod state;
pub mod upstream;

pub use auth::Caller;
pub use config::{GatewayConfig, UpstreamConfig};
pub use error::ApiError;
pub use routes::create_router;
pub use state::GatewayState;
pub use upstream::{ByteStream, CompletionUpstream, HttpUpstream, UpstreamError};
