//! Content deltas from a chat-completion byte stream.

use std::collections::VecDeque;
use std::fmt::Display;
use std::time::Duration;

use bytes::Bytes;
use futures::Stream;

use crate::error::Result;
use crate::reader::TextReader;
use crate::sse::{ParserStats, SseParser};

/// Reads the text fragments of a streamed completion, one at a time.
///
/// Combines a [`TextReader`] with an [`SseParser`]. The stream ends when the
/// source is exhausted or `[DONE]` is seen; after `[DONE]` the source is not
/// polled again.
pub struct DeltaReader<S> {
    text: TextReader<S>,
    parser: SseParser,
    ready: VecDeque<String>,
    flushed: bool,
}

impl<S, E> DeltaReader<S>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
    E: Display,
{
    /// Wrap a chunk source.
    pub fn new(source: S) -> Self {
        Self {
            text: TextReader::new(source),
            parser: SseParser::new(),
            ready: VecDeque::new(),
            flushed: false,
        }
    }

    /// Fail when no chunk arrives within `timeout`.
    #[must_use]
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.text = self.text.with_idle_timeout(timeout);
        self
    }

    /// Next non-empty delta, or `None` once the stream is over.
    ///
    /// # Errors
    ///
    /// Returns an error if the source fails or goes idle.
    pub async fn next_delta(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(delta) = self.ready.pop_front() {
                return Ok(Some(delta));
            }
            if self.flushed {
                return Ok(None);
            }
            if self.parser.is_done() {
                self.flushed = true;
                self.log_stats();
                return Ok(None);
            }

            match self.text.next_text().await? {
                Some(text) => self.ready.extend(self.parser.feed(&text)),
                None => {
                    self.flushed = true;
                    self.ready.extend(self.parser.finish());
                    self.log_stats();
                }
            }
        }
    }

    fn log_stats(&self) {
        let stats = self.parser.stats();
        tracing::debug!(
            lines = stats.lines,
            deltas = stats.deltas,
            recovered = stats.recovered,
            dropped = stats.dropped,
            done = self.parser.is_done(),
            "Stream ended"
        );
    }

    /// Drain the stream and return the concatenated text.
    ///
    /// # Errors
    ///
    /// Returns an error if the source fails or goes idle.
    pub async fn collect_text(mut self) -> Result<String> {
        let mut text = String::new();
        while let Some(delta) = self.next_delta().await? {
            text.push_str(&delta);
        }
        Ok(text)
    }

    /// Whether the `[DONE]` sentinel has been seen.
    #[must_use]
    pub const fn saw_done(&self) -> bool {
        self.parser.is_done()
    }

    /// Parser counters so far.
    #[must_use]
    pub const fn stats(&self) -> ParserStats {
        self.parser.stats()
    }
}
