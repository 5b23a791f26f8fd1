//! Streaming tutor chat.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use study_buddy_core::ConversationMessage;

use crate::auth::Caller;
use crate::error::ApiError;
use crate::prompt::{with_system_prompt, TutorSettings};
use crate::state::GatewayState;
use crate::upstream::CompletionUpstream;

// =============================================================================
// Request Types
// =============================================================================

/// Body of a chat request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatBody {
    /// The whole conversation so far, oldest first.
    #[serde(default)]
    pub messages: Option<Vec<ConversationMessage>>,
    /// Study topic.
    #[serde(default)]
    pub topic: Option<String>,
    /// Background material for the topic.
    #[serde(default)]
    pub context: Option<String>,
    /// Reply language code.
    #[serde(default)]
    pub language: Option<String>,
    /// Learner's communication style.
    #[serde(default)]
    pub communication_style: Option<String>,
}

impl ChatBody {
    fn settings(&self) -> TutorSettings {
        TutorSettings {
            topic: self.topic.clone(),
            context: self.context.clone(),
            language: self.language.clone(),
            style: self.communication_style.clone(),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Forward a conversation upstream and stream the reply back.
///
/// The response is `text/event-stream` and carries the upstream's frames
/// unchanged.
///
/// # Errors
///
/// Returns an error if:
/// - The body is not valid JSON or has no messages
/// - The upstream key is not configured
/// - The upstream rejects the request
pub async fn chat<U>(
    State(state): State<Arc<GatewayState<U>>>,
    caller: Caller,
    payload: Result<Json<ChatBody>, JsonRejection>,
) -> Result<Response, ApiError>
where
    U: CompletionUpstream + 'static,
{
    let Json(body) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let settings = body.settings();
    let messages = body
        .messages
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Please provide messages".to_string()))?;

    tracing::info!(
        caller = %caller,
        turns = messages.len(),
        language = settings.language(),
        topic = ?settings.topic,
        "Forwarding chat"
    );

    let prompt = with_system_prompt(&settings, &messages);
    let stream = state.upstream.stream_completion(prompt).await?;

    Ok((
        [(CONTENT_TYPE, "text/event-stream"), (CACHE_CONTROL, "no-cache")],
        Body::from_stream(stream),
    )
        .into_response())
}
