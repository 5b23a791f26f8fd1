//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{chat, explain, health};
use crate::state::GatewayState;
use crate::upstream::CompletionUpstream;

/// Paths the chat handler is mounted at. The `/functions/v1/...` forms
/// match the serverless deployment existing front-ends call.
pub const CHAT_PATHS: [&str; 3] = [
    "/v1/chat",
    "/functions/v1/echo-assistant",
    "/functions/v1/chat-tutor",
];

/// Create the gateway router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Tutor (client key when configured)
/// - `POST /v1/chat` - Stream a tutor reply as server-sent events
/// - `POST /functions/v1/echo-assistant` - Alias of `/v1/chat`
/// - `POST /functions/v1/chat-tutor` - Alias of `/v1/chat`
/// - `POST /v1/explain` - Explain a topic, answered as JSON
pub fn create_router<U>(state: GatewayState<U>) -> Router
where
    U: CompletionUpstream + 'static,
{
    // Extract config values before moving state
    let cors = build_cors_layer(&state.config.cors_origins);
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout = state.config.request_timeout();

    let state = Arc::new(state);

    let mut router = Router::new()
        // Health (public)
        .route("/health", get(health::health::<U>))
        .route("/v1/explain", post(explain::explain::<U>));

    for path in CHAT_PATHS {
        router = router.route(path, post(chat::chat::<U>));
    }

    router
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use tower::ServiceExt;

    use crate::config::GatewayConfig;
    use crate::prompt::PromptMessage;
    use crate::upstream::{ByteStream, UpstreamError};

    struct Unreachable;

    #[async_trait::async_trait]
    impl CompletionUpstream for Unreachable {
        async fn stream_completion(
            &self,
            _messages: Vec<PromptMessage>,
        ) -> Result<ByteStream, UpstreamError> {
            Err(UpstreamError::Transport("unreachable".into()))
        }
    }

    fn router(cors_origins: Vec<String>) -> Router {
        let config = GatewayConfig {
            cors_origins,
            ..GatewayConfig::default()
        };
        create_router(GatewayState::new(Arc::new(Unreachable), config))
    }

    #[tokio::test]
    async fn preflight_is_answered_for_any_origin() {
        let response = router(vec!["*".to_string()])
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/v1/chat")
                    .header(header::ORIGIN, "http://localhost:5173")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }

    #[tokio::test]
    async fn specific_origin_is_echoed() {
        let response = router(vec!["https://study.example.com".to_string()])
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(header::ORIGIN, "https://study.example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://study.example.com"
        );
    }

    #[tokio::test]
    async fn every_chat_alias_is_routed() {
        for path in CHAT_PATHS {
            let response = router(vec!["*".to_string()])
                .oneshot(
                    Request::builder()
                        .method(Method::POST)
                        .uri(path)
                        .header(header::CONTENT_TYPE, "application/json")
                        .body(Body::from(r#"{"messages":[]}"#))
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{path}");
        }
    }
}
