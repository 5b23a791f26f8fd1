//! Application state.
//!
//! Owns the conversation, the single live stream, and the optional narrator.
//! Turns are submitted here; stream events come back through the receiver
//! returned by [`App::new`] and are applied with [`App::handle_event`].

use std::time::Duration;

use study_buddy_core::{Conversation, CoreError, StreamId};
use study_buddy_stream::{narration_text, SessionSlot, StreamSession};
use tokio::sync::mpsc;

use crate::client::ChatClient;
use crate::error::ClientError;
use crate::speech::{Capability, Narrator};
use crate::stream::{spawn_stream, ChatEvent, EVENT_CHANNEL_CAPACITY};
use crate::types::{ChatRequest, ExplainLevel, ExplainRequest, TutorSettings};

/// Default time to wait for the next chunk of a reply.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Canned follow-up questions offered after a reply.
pub const SUGGESTED_QUESTIONS: [&str; 4] = [
    "Can you give me a simpler analogy?",
    "What are common mistakes about this?",
    "How is this used in real life?",
    "Can you quiz me on this?",
];

/// Greeting shown when a conversation starts, in the learner's language.
///
/// Unknown languages get the English text.
#[must_use]
pub fn welcome_message(language: &str) -> &'static str {
    match language {
        "hi" => "नमस्ते! 👋 मैं आपका Study Buddy हूं, और मैं आपको सीखने में मदद करने के लिए यहां हूं! मुझसे कुछ भी पूछें - मैं अपनी संचार शैली को आपके अनुसार ढाल लूंगा।",
        "es" => "¡Hola! 👋 Soy tu Study Buddy, ¡estoy aquí para ayudarte a aprender! Siéntete libre de preguntarme cualquier cosa.",
        "fr" => "Bonjour! 👋 Je suis ton Study Buddy, et je suis ici pour t'aider à apprendre! N'hésite pas à me poser des questions.",
        "de" => "Hallo! 👋 Ich bin dein Study Buddy und bin hier, um dir beim Lernen zu helfen! Frag mich einfach alles.",
        "pt" => "Olá! 👋 Sou seu Study Buddy e estou aqui para ajudá-lo a aprender! Sinta-se livre para me fazer qualquer pergunta.",
        "ja" => "こんにちは! 👋 私はあなたのStudy Buddyです。学習をお手伝いします！何でもお聞きください。",
        "zh" => "你好! 👋 我是你的Study Buddy。我在这里帮助你学习！随时可以问我任何问题。",
        _ => "Hi there! 👋 I'm your Study Buddy, and I'm here to help you learn! Feel free to ask me anything - I'll adapt my communication style to match yours.",
    }
}

/// What a stream event changed, for the caller to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    /// A piece of the reply arrived.
    Delta(String),
    /// The reply is complete; this is its final text.
    Finished(String),
    /// The reply failed. The remediation was appended to the conversation.
    Failed {
        /// Text that had arrived before the failure.
        partial: Option<String>,
        /// The chat turn explaining the failure.
        remediation: String,
    },
}

/// The study buddy chat.
pub struct App<N> {
    client: ChatClient,
    settings: TutorSettings,
    conversation: Conversation,
    slot: SessionSlot,
    session: Option<StreamSession>,
    narrator: Capability<N>,
    events: mpsc::Sender<ChatEvent>,
    idle_timeout: Duration,
}

impl<N: Narrator> App<N> {
    /// Create the app and the receiver its stream events arrive on.
    pub fn new(
        client: ChatClient,
        settings: TutorSettings,
        narrator: Capability<N>,
    ) -> (Self, mpsc::Receiver<ChatEvent>) {
        let (events, receiver) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let app = Self {
            client,
            settings,
            conversation: Conversation::new(),
            slot: SessionSlot::new(),
            session: None,
            narrator,
            events,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        };
        (app, receiver)
    }

    /// Fail a reply when no chunk arrives within `timeout`.
    #[must_use]
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The conversation so far.
    #[must_use]
    pub const fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Current tutor settings.
    #[must_use]
    pub const fn settings(&self) -> &TutorSettings {
        &self.settings
    }

    /// Change tutor settings; they apply from the next turn.
    pub fn settings_mut(&mut self) -> &mut TutorSettings {
        &mut self.settings
    }

    /// The gateway client.
    #[must_use]
    pub const fn client(&self) -> &ChatClient {
        &self.client
    }

    /// Whether a reply is being received.
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.slot.current().is_some()
    }

    /// Text of the reply being received, if any.
    #[must_use]
    pub fn streaming_text(&self) -> Option<&str> {
        self.session
            .as_ref()
            .filter(|s| s.is_active())
            .map(StreamSession::text)
    }

    /// Whether replies can be read aloud.
    #[must_use]
    pub const fn can_speak(&self) -> bool {
        self.narrator.is_supported()
    }

    // =========================================================================
    // Turns
    // =========================================================================

    /// Send a user message and start streaming the reply.
    ///
    /// Any reply still streaming is abandoned first. Returns the new turn's
    /// id, or `None` when the request failed; the failure is then already in
    /// the conversation as an assistant turn.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyMessage`] for blank input.
    pub async fn submit(&mut self, text: &str) -> Result<Option<StreamId>, CoreError> {
        if text.trim().is_empty() {
            return Err(CoreError::EmptyMessage);
        }

        if let Some(narrator) = self.narrator.as_mut() {
            narrator.stop();
        }

        self.conversation.push_user(text)?;

        let ticket = self.slot.begin();
        let id = ticket.id;
        if let Some(mut previous) = self.session.replace(StreamSession::new(id)) {
            if previous.is_active() {
                previous.complete();
            }
        }

        let request = ChatRequest::new(self.conversation.messages().to_vec(), &self.settings);
        match self.client.open_stream(&request).await {
            Ok(response) => {
                tracing::info!(stream_id = %id, turns = request.messages.len(), "Reply streaming");
                spawn_stream(
                    Box::pin(response.bytes_stream()),
                    ticket,
                    self.idle_timeout,
                    self.events.clone(),
                );
                Ok(Some(id))
            }
            Err(err) => {
                self.slot.end(id);
                self.fail_session(id, &err);
                Ok(None)
            }
        }
    }

    /// Apply a stream event.
    ///
    /// Events from any turn other than the live one are dropped and return
    /// `None`.
    pub fn handle_event(&mut self, event: ChatEvent) -> Option<Update> {
        let id = event.id();
        if !self.slot.is_current(id) {
            tracing::debug!(stream_id = %id, "Dropping event from stale stream");
            return None;
        }
        let session = self.session.as_mut().filter(|s| s.id() == id)?;

        match event {
            ChatEvent::Delta { text, .. } => {
                session.apply_delta(&text, &mut self.conversation)?;
                Some(Update::Delta(text))
            }
            ChatEvent::Finished { .. } => {
                self.slot.end(id);
                let text = session.complete();
                self.narrate(&text);
                Some(Update::Finished(text))
            }
            ChatEvent::Failed { error, .. } => {
                self.slot.end(id);
                Some(self.fail_session(id, &error))
            }
        }
    }

    /// Stop the live reply. Text received so far stays in the conversation.
    ///
    /// Returns that text, if any arrived.
    pub fn cancel(&mut self) -> Option<String> {
        let id = self.slot.cancel()?;
        let session = self.session.as_mut().filter(|s| s.id() == id)?;
        let text = session.complete();
        tracing::info!(stream_id = %id, "Reply cancelled");
        (!text.is_empty()).then_some(text)
    }

    /// Stop reading aloud.
    pub fn stop_speaking(&mut self) {
        if let Some(narrator) = self.narrator.as_mut() {
            narrator.stop();
        }
    }

    /// Ask for a one-shot explanation; it is not added to the conversation.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway request fails.
    pub async fn explain(
        &self,
        topic: &str,
        level: ExplainLevel,
        examples: bool,
    ) -> Result<String, ClientError> {
        let request = ExplainRequest {
            topic: topic.trim().to_string(),
            level,
            examples,
        };
        self.client.explain(&request).await
    }

    fn fail_session(&mut self, id: StreamId, error: &ClientError) -> Update {
        let partial = self
            .session
            .as_mut()
            .filter(|s| s.id() == id)
            .and_then(|s| s.fail(error));
        let remediation = error.remediation();
        self.conversation.push_assistant(remediation.clone());
        Update::Failed {
            partial,
            remediation,
        }
    }

    fn narrate(&mut self, text: &str) {
        let Some(narrator) = self.narrator.as_mut() else {
            return;
        };
        let prose = narration_text(text);
        if prose.is_empty() {
            return;
        }
        if let Err(err) = narrator.speak(&prose) {
            tracing::warn!(error = %err, "Could not read reply aloud");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::SpeechError;

    #[derive(Default)]
    struct Mute {
        stops: usize,
    }

    impl Narrator for Mute {
        fn speak(&mut self, _text: &str) -> Result<(), SpeechError> {
            Ok(())
        }

        fn stop(&mut self) {
            self.stops += 1;
        }

        fn is_speaking(&mut self) -> bool {
            false
        }
    }

    fn app() -> (App<Mute>, mpsc::Receiver<ChatEvent>) {
        App::new(
            ChatClient::new("http://127.0.0.1:9", None),
            TutorSettings::default(),
            Capability::Supported(Mute::default()),
        )
    }

    #[test]
    fn welcome_covers_languages() {
        for lang in ["en", "hi", "es", "fr", "de", "pt", "ja", "zh"] {
            assert!(welcome_message(lang).contains("Study Buddy"), "{lang}");
        }
        assert_eq!(welcome_message("xx"), welcome_message("en"));
        assert!(welcome_message("es").starts_with("¡Hola!"));
    }

    #[test]
    fn suggestions_are_follow_ups() {
        assert_eq!(SUGGESTED_QUESTIONS.len(), 4);
        assert!(SUGGESTED_QUESTIONS.iter().all(|q| q.ends_with('?')));
    }

    #[tokio::test]
    async fn blank_input_is_rejected_before_anything_else() {
        let (mut app, _rx) = app();
        assert!(matches!(app.submit("   ").await, Err(CoreError::EmptyMessage)));
        assert!(app.conversation().is_empty());
        assert_eq!(app.narrator.as_mut().map(|n| n.stops), Some(0));
    }

    #[test]
    fn events_without_a_live_turn_are_dropped() {
        let (mut app, _rx) = app();
        let update = app.handle_event(ChatEvent::Delta {
            id: StreamId::generate(),
            text: "late".into(),
        });
        assert!(update.is_none());
        assert!(app.conversation().is_empty());
    }

    #[test]
    fn cancel_without_a_live_turn_is_a_no_op() {
        let (mut app, _rx) = app();
        assert!(app.cancel().is_none());
        assert!(!app.is_streaming());
    }

    #[test]
    fn settings_can_change() {
        let (mut app, _rx) = app();
        app.settings_mut().language = "hi".into();
        assert_eq!(app.settings().language, "hi");
        assert!(app.can_speak());
    }
}
