//! Request and response types for the gateway API.
//!
//! These types mirror the bodies the study-buddy gateway accepts and returns.

use serde::{Deserialize, Serialize};
use study_buddy_core::ConversationMessage;

// =============================================================================
// Tutor Settings
// =============================================================================

/// How the learner likes to be spoken to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CommunicationStyle {
    /// Energetic, lots of encouragement.
    Enthusiastic,
    /// Curious learner; answers invite follow-ups.
    Inquisitive,
    /// Short and to the point.
    Brief,
    /// Plain and clear.
    #[default]
    Neutral,
}

impl CommunicationStyle {
    /// Wire name of the style.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Enthusiastic => "enthusiastic",
            Self::Inquisitive => "inquisitive",
            Self::Brief => "brief",
            Self::Neutral => "neutral",
        }
    }
}

/// Per-conversation tutor settings sent with every turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutorSettings {
    /// Study topic.
    pub topic: Option<String>,
    /// Background material for the topic.
    pub context: Option<String>,
    /// Reply language code, e.g. `en` or `hi`.
    pub language: String,
    /// Learner's communication style.
    pub style: CommunicationStyle,
}

impl Default for TutorSettings {
    fn default() -> Self {
        Self {
            topic: None,
            context: None,
            language: "en".to_string(),
            style: CommunicationStyle::default(),
        }
    }
}

// =============================================================================
// Chat
// =============================================================================

/// Body of `POST /v1/chat`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// The whole conversation so far, oldest first.
    pub messages: Vec<ConversationMessage>,
    /// Study topic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Background material.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Reply language code.
    pub language: String,
    /// Learner's communication style.
    pub communication_style: CommunicationStyle,
}

impl ChatRequest {
    /// Build a request from a conversation and the current settings.
    #[must_use]
    pub fn new(messages: Vec<ConversationMessage>, settings: &TutorSettings) -> Self {
        Self {
            messages,
            topic: settings.topic.clone(),
            context: settings.context.clone(),
            language: settings.language.clone(),
            communication_style: settings.style,
        }
    }
}

// =============================================================================
// Explain
// =============================================================================

/// Depth of an explanation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
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

/// Body of `POST /v1/explain`.
#[derive(Debug, Clone, Serialize)]
pub struct ExplainRequest {
    /// Topic to explain.
    pub topic: String,
    /// Requested depth.
    pub level: ExplainLevel,
    /// Whether to include worked examples.
    pub examples: bool,
}

/// Response of `POST /v1/explain`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExplainResponse {
    /// The assembled explanation.
    pub result: String,
}

// =============================================================================
// Health
// =============================================================================

/// Response of `GET /health`.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    /// Service status.
    pub status: String,
    /// Gateway version.
    pub version: String,
    /// Whether the gateway has an upstream API key.
    pub upstream_configured: bool,
    /// Whether the gateway expects a client key.
    pub client_key_required: bool,
}

impl HealthStatus {
    /// Setup problems that would make chat requests fail, given whether
    /// this client sends a key.
    #[must_use]
    pub fn problems(&self, has_token: bool) -> Vec<&'static str> {
        let mut problems = Vec::new();
        if !self.upstream_configured {
            problems.push("The gateway has no UPSTREAM_API_KEY set, so chats will fail.");
        }
        if self.client_key_required && !has_token {
            problems.push("The gateway requires a client key. Pass one with --token.");
        }
        problems
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Error body returned by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    /// Error details.
    pub error: ApiErrorDetail,
}

/// Inner part of [`ApiErrorResponse`].
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    /// Machine-readable code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chat_request_wire_shape() {
        let settings = TutorSettings {
            topic: Some("Cells".into()),
            style: CommunicationStyle::Brief,
            ..TutorSettings::default()
        };
        let request = ChatRequest::new(vec![ConversationMessage::user("hi")], &settings);

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "messages": [{ "role": "user", "content": "hi" }],
                "topic": "Cells",
                "language": "en",
                "communicationStyle": "brief"
            })
        );
    }

    fn health(upstream_configured: bool, client_key_required: bool) -> HealthStatus {
        serde_json::from_value(json!({
            "status": "healthy",
            "version": "0.1.0",
            "upstream_configured": upstream_configured,
            "client_key_required": client_key_required
        }))
        .unwrap()
    }

    #[test]
    fn healthy_gateway_has_no_problems() {
        assert!(health(true, false).problems(false).is_empty());
        assert!(health(true, true).problems(true).is_empty());
    }

    #[test]
    fn missing_keys_are_problems() {
        let problems = health(false, true).problems(false);
        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("UPSTREAM_API_KEY"));
        assert!(problems[1].contains("--token"));
    }

    #[test]
    fn gateway_error_body_parses() {
        let body: ApiErrorResponse = serde_json::from_value(json!({
            "error": { "code": "bad_request", "message": "Please provide messages" }
        }))
        .unwrap();
        assert_eq!(body.error.code, "bad_request");
        assert_eq!(body.error.message, "Please provide messages");
    }
}
