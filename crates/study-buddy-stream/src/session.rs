//! Stream sessions and the single-live-session rule.
//!
//! A conversation has at most one meaningful in-flight stream. Starting a new
//! turn aborts the previous stream's reading task, and events still arriving
//! from it are recognised by their [`StreamId`] and dropped.

use std::fmt::Display;

use chrono::{DateTime, Utc};
use futures::future::{AbortHandle, AbortRegistration};
use parking_lot::Mutex;
use study_buddy_core::{Conversation, StreamId, Upsert};

use crate::assembler::MessageAssembler;

/// One request/response cycle.
#[derive(Debug)]
pub struct StreamSession {
    id: StreamId,
    started_at: DateTime<Utc>,
    assembler: MessageAssembler,
    active: bool,
    last_error: Option<String>,
}

impl StreamSession {
    /// Start an active session.
    #[must_use]
    pub fn new(id: StreamId) -> Self {
        Self {
            id,
            started_at: Utc::now(),
            assembler: MessageAssembler::new(),
            active: true,
            last_error: None,
        }
    }

    /// Session identity.
    #[must_use]
    pub const fn id(&self) -> StreamId {
        self.id
    }

    /// When the session began.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Whether deltas are still being accepted.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Why the session failed, if it did.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Text assembled so far.
    #[must_use]
    pub fn text(&self) -> &str {
        self.assembler.text()
    }

    /// Apply one delta to the conversation. Ignored once the session ended.
    pub fn apply_delta(&mut self, delta: &str, conversation: &mut Conversation) -> Option<Upsert> {
        if !self.active {
            tracing::debug!(stream_id = %self.id, "Delta after session end ignored");
            return None;
        }
        self.assembler.apply(delta, conversation)
    }

    /// End the session normally and return the frozen reply text.
    pub fn complete(&mut self) -> String {
        self.active = false;
        let text = std::mem::take(&mut self.assembler).finish();
        tracing::debug!(
            stream_id = %self.id,
            chars = text.chars().count(),
            elapsed_ms = (Utc::now() - self.started_at).num_milliseconds(),
            "Stream session completed"
        );
        text
    }

    /// End the session with an error.
    ///
    /// Returns the partial reply if any text had arrived.
    pub fn fail(&mut self, error: impl Display) -> Option<String> {
        self.active = false;
        let message = error.to_string();
        tracing::warn!(stream_id = %self.id, error = %message, "Stream session failed");
        self.last_error = Some(message);
        let text = std::mem::take(&mut self.assembler).finish();
        (!text.is_empty()).then_some(text)
    }
}

/// Handed out by [`SessionSlot::begin`].
#[derive(Debug)]
pub struct SessionTicket {
    /// Identity of the new session.
    pub id: StreamId,
    /// Wrap the reading task in [`futures::future::Abortable`] with this.
    pub registration: AbortRegistration,
}

/// Holds the one live stream of a conversation.
#[derive(Debug, Default)]
pub struct SessionSlot {
    live: Mutex<Option<(StreamId, AbortHandle)>>,
}

impl SessionSlot {
    /// Create an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session, aborting the previous one if still live.
    pub fn begin(&self) -> SessionTicket {
        let id = StreamId::generate();
        let (handle, registration) = AbortHandle::new_pair();

        if let Some((previous, handle)) = self.live.lock().replace((id, handle)) {
            handle.abort();
            tracing::debug!(stream_id = %previous, superseded_by = %id, "Aborted previous stream");
        }

        SessionTicket { id, registration }
    }

    /// The live session, if any.
    #[must_use]
    pub fn current(&self) -> Option<StreamId> {
        self.live.lock().as_ref().map(|(id, _)| *id)
    }

    /// Whether `id` is the live session.
    #[must_use]
    pub fn is_current(&self, id: StreamId) -> bool {
        self.current() == Some(id)
    }

    /// Release the slot if `id` still holds it.
    ///
    /// Returns `false` for a superseded session.
    pub fn end(&self, id: StreamId) -> bool {
        let mut live = self.live.lock();
        match live.as_ref() {
            Some((current, _)) if *current == id => {
                *live = None;
                true
            }
            _ => false,
        }
    }

    /// Abort and release the live session.
    pub fn cancel(&self) -> Option<StreamId> {
        let (id, handle) = self.live.lock().take()?;
        handle.abort();
        tracing::debug!(stream_id = %id, "Stream cancelled");
        Some(id)
    }
}
