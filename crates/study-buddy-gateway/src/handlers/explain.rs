//! One-shot topic explanations.
//!
//! Runs the same streamed completion as chat, but assembles the reply on the
//! gateway and answers with plain JSON.

use std::fmt;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use study_buddy_core::ConversationMessage;
use study_buddy_stream::DeltaReader;

use crate::auth::Caller;
use crate::error::ApiError;
use crate::prompt::{with_system_prompt, TutorSettings};
use crate::state::GatewayState;
use crate::upstream::CompletionUpstream;

/// Depth of an explanation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplainLevel {
    /// Introductory.
    #[default]
    Basic,
    /// Some prior knowledge assumed.
    Intermediate,
    /// Expert audience.
    Advanced,
}

impl fmt::Display for ExplainLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Basic => "basic",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        })
    }
}

/// Body of an explain request.
#[derive(Debug, Deserialize)]
pub struct ExplainBody {
    /// Topic to explain.
    #[serde(default)]
    pub topic: String,
    /// Requested depth.
    #[serde(default)]
    pub level: ExplainLevel,
    /// Whether to include worked examples.
    #[serde(default)]
    pub examples: bool,
}

impl ExplainBody {
    /// The single user turn sent upstream.
    #[must_use]
    pub fn question(&self) -> String {
        let mut question = format!(
            "Explain the following topic: {}\nPitch the explanation at the {} level.",
            self.topic.trim(),
            self.level
        );
        if self.examples {
            question.push_str("\nInclude concrete examples.");
        }
        question
    }
}

/// Response of an explain request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExplainResponse {
    /// The assembled explanation.
    pub result: String,
}

/// Explain a topic in one response.
///
/// # Errors
///
/// Returns an error if the topic is empty, the upstream rejects the request,
/// or its stream fails before completing.
pub async fn explain<U>(
    State(state): State<Arc<GatewayState<U>>>,
    caller: Caller,
    payload: Result<Json<ExplainBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    U: CompletionUpstream + 'static,
{
    let Json(body) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    if body.topic.trim().is_empty() {
        return Err(ApiError::BadRequest("Please provide a topic".to_string()));
    }

    tracing::info!(caller = %caller, topic = %body.topic, level = %body.level, "Explaining topic");

    let settings = TutorSettings {
        topic: Some(body.topic.clone()),
        ..TutorSettings::default()
    };
    let conversation = [ConversationMessage::user(body.question())];
    let stream = state
        .upstream
        .stream_completion(with_system_prompt(&settings, &conversation))
        .await?;

    let result = DeltaReader::new(stream)
        .with_idle_timeout(state.config.upstream.idle_timeout())
        .collect_text()
        .await?;

    Ok(Json(ExplainResponse { result }))
}
