//! Background reading of a chat reply.
//!
//! Each turn gets its own task. The task turns the response body into content
//! deltas and sends them to the app over an mpsc channel, tagged with the
//! turn's [`StreamId`] so that events from a superseded turn can be dropped.

use std::fmt::Display;
use std::time::Duration;

use bytes::Bytes;
use futures::future::Abortable;
use futures::Stream;
use study_buddy_core::StreamId;
use study_buddy_stream::{DeltaReader, SessionTicket};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::ClientError;

/// Capacity of the event channel between stream tasks and the app.
pub const EVENT_CHANNEL_CAPACITY: usize = 128;

/// Events sent from a stream task to the app.
#[derive(Debug)]
pub enum ChatEvent {
    /// A piece of the reply.
    Delta {
        /// Turn the delta belongs to.
        id: StreamId,
        /// Reply text.
        text: String,
    },
    /// The reply is complete.
    Finished {
        /// Turn that finished.
        id: StreamId,
    },
    /// The reply stream failed.
    Failed {
        /// Turn that failed.
        id: StreamId,
        /// What went wrong.
        error: ClientError,
    },
}

impl ChatEvent {
    /// Turn this event belongs to.
    #[must_use]
    pub const fn id(&self) -> StreamId {
        match self {
            Self::Delta { id, .. } | Self::Finished { id } | Self::Failed { id, .. } => *id,
        }
    }
}

/// Spawn the reading task for one turn.
///
/// The task is wrapped in [`Abortable`] with the ticket's registration, so
/// beginning a new session stops it without waiting for the next chunk.
pub fn spawn_stream<S, E>(
    source: S,
    ticket: SessionTicket,
    idle_timeout: Duration,
    events: mpsc::Sender<ChatEvent>,
) -> JoinHandle<()>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin + Send + 'static,
    E: Display + Send + 'static,
{
    let SessionTicket { id, registration } = ticket;

    let task = async move {
        let mut reader = DeltaReader::new(source).with_idle_timeout(idle_timeout);
        let last = loop {
            match reader.next_delta().await {
                Ok(Some(text)) => {
                    if events.send(ChatEvent::Delta { id, text }).await.is_err() {
                        tracing::debug!(stream_id = %id, "Event receiver dropped");
                        return;
                    }
                }
                Ok(None) => break ChatEvent::Finished { id },
                Err(err) => {
                    break ChatEvent::Failed {
                        id,
                        error: ClientError::Stream(err),
                    }
                }
            }
        };
        if events.send(last).await.is_err() {
            tracing::debug!(stream_id = %id, "Event receiver dropped before turn ended");
        }
    };

    tokio::spawn(async move {
        if Abortable::new(task, registration).await.is_err() {
            tracing::debug!(stream_id = %id, "Stream task aborted");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use study_buddy_stream::SessionSlot;

    fn chunks(parts: &[&'static str]) -> impl Stream<Item = Result<Bytes, Infallible>> + Unpin {
        futures::stream::iter(
            parts
                .iter()
                .copied()
                .map(|p| Ok(Bytes::from_static(p.as_bytes())))
                .collect::<Vec<_>>(),
        )
    }

    async fn drain(rx: &mut mpsc::Receiver<ChatEvent>) -> Vec<ChatEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn sends_deltas_then_finished() {
        let slot = SessionSlot::new();
        let ticket = slot.begin();
        let id = ticket.id;
        let (tx, mut rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        spawn_stream(
            chunks(&[
                "data: {\"choices\":[{\"delta\":{\"content\":\"Hel",
                "lo\"}}]}\n",
                "data: {\"choices\":[{\"delta\":{\"content\":\" world\"}}]}\ndata: [DONE]\n",
            ]),
            ticket,
            Duration::from_secs(5),
            tx,
        )
        .await
        .unwrap();

        let events = drain(&mut rx).await;
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.id() == id));
        assert!(matches!(&events[0], ChatEvent::Delta { text, .. } if text == "Hello"));
        assert!(matches!(&events[1], ChatEvent::Delta { text, .. } if text == " world"));
        assert!(matches!(events[2], ChatEvent::Finished { .. }));
    }

    #[tokio::test]
    async fn transport_error_is_reported() {
        let slot = SessionSlot::new();
        let ticket = slot.begin();
        let (tx, mut rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let source = futures::stream::iter(vec![
            Ok(Bytes::from_static(b"data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n")),
            Err("connection reset"),
        ]);

        spawn_stream(source, ticket, Duration::from_secs(5), tx)
            .await
            .unwrap();

        let events = drain(&mut rx).await;
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[1],
            ChatEvent::Failed { error: ClientError::Stream(_), .. }
        ));
    }

    #[tokio::test]
    async fn dropped_receiver_ends_the_task() {
        let slot = SessionSlot::new();
        let ticket = slot.begin();
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        drop(rx);

        spawn_stream(
            chunks(&["data: [DONE]\n"]),
            ticket,
            Duration::from_secs(5),
            tx,
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn aborted_task_sends_nothing_more() {
        let slot = SessionSlot::new();
        let ticket = slot.begin();
        let (tx, mut rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let handle = spawn_stream(
            futures::stream::pending::<Result<Bytes, Infallible>>(),
            ticket,
            Duration::from_secs(3600),
            tx,
        );
        slot.cancel();
        handle.await.unwrap();

        assert!(drain(&mut rx).await.is_empty());
    }
}
