//! Byte stream to text fragments.
//!
//! Pulls raw chunks from an HTTP body (or any chunk source) until it is
//! exhausted and decodes them with a decoder whose state persists between
//! chunks.

use std::fmt::Display;
use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt};

use crate::decoder::Utf8StreamDecoder;
use crate::error::{Result, StreamError};

/// Reads decoded text fragments from a byte-chunk source.
///
/// The source's end of stream is the "done" signal. Concatenating every
/// fragment equals decoding the whole byte stream at once.
pub struct TextReader<S> {
    source: S,
    decoder: Utf8StreamDecoder,
    idle_timeout: Option<Duration>,
    exhausted: bool,
}

impl<S, E> TextReader<S>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
    E: Display,
{
    /// Wrap a chunk source.
    pub fn new(source: S) -> Self {
        Self {
            source,
            decoder: Utf8StreamDecoder::new(),
            idle_timeout: None,
            exhausted: false,
        }
    }

    /// Fail with [`StreamError::IdleTimeout`] when no chunk arrives within
    /// `timeout`.
    #[must_use]
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Read the next text fragment.
    ///
    /// Returns `None` once the source is exhausted and the decoder's final
    /// pass has been returned. Chunks that decode to nothing (a lone prefix
    /// of a multi-byte character) are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the source fails or the idle timeout elapses.
    pub async fn next_text(&mut self) -> Result<Option<String>> {
        while !self.exhausted {
            match self.next_chunk().await? {
                Some(chunk) => {
                    let text = self.decoder.decode(&chunk);
                    if !text.is_empty() {
                        return Ok(Some(text));
                    }
                }
                None => {
                    self.exhausted = true;
                    let rest = self.decoder.finish();
                    if !rest.is_empty() {
                        return Ok(Some(rest));
                    }
                }
            }
        }
        Ok(None)
    }

    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        let next = match self.idle_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.source.next())
                .await
                .map_err(|_| StreamError::IdleTimeout(timeout))?,
            None => self.source.next().await,
        };

        next.transpose()
            .map_err(|e| StreamError::Transport(e.to_string()))
    }

    /// Consume the reader and return the chunk source.
    pub fn into_inner(self) -> S {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn chunks(
        parts: Vec<&'static [u8]>,
    ) -> impl Stream<Item = std::result::Result<Bytes, Infallible>> + Unpin {
        futures::stream::iter(parts.into_iter().map(|p| Ok(Bytes::from_static(p))))
    }

    #[tokio::test]
    async fn yields_fragments_in_order() {
        let mut reader = TextReader::new(chunks(vec![b"data: ".as_slice(), b"{}\n".as_slice()]));
        assert_eq!(reader.next_text().await.unwrap().as_deref(), Some("data: "));
        assert_eq!(reader.next_text().await.unwrap().as_deref(), Some("{}\n"));
        assert_eq!(reader.next_text().await.unwrap(), None);
        assert_eq!(reader.next_text().await.unwrap(), None);
    }

    #[tokio::test]
    async fn skips_chunks_that_only_start_a_character() {
        let mut reader = TextReader::new(chunks(vec![b"\xC3".as_slice(), b"\xA9".as_slice()]));
        assert_eq!(reader.next_text().await.unwrap().as_deref(), Some("é"));
        assert_eq!(reader.next_text().await.unwrap(), None);
    }

    #[tokio::test]
    async fn flushes_truncated_tail_at_end() {
        let mut reader = TextReader::new(chunks(vec![b"ok".as_slice(), b"\xE2\x82".as_slice()]));
        assert_eq!(reader.next_text().await.unwrap().as_deref(), Some("ok"));
        assert_eq!(reader.next_text().await.unwrap().as_deref(), Some("\u{FFFD}"));
        assert_eq!(reader.next_text().await.unwrap(), None);
    }

    #[tokio::test]
    async fn source_error_is_transport_error() {
        let source = futures::stream::iter(vec![
            Ok(Bytes::from_static(b"a")),
            Err("connection reset"),
        ]);
        let mut reader = TextReader::new(source);
        assert_eq!(reader.next_text().await.unwrap().as_deref(), Some("a"));
        let err = reader.next_text().await.unwrap_err();
        assert!(matches!(err, StreamError::Transport(ref msg) if msg == "connection reset"));
    }

    #[tokio::test]
    async fn idle_source_times_out() {
        let source = futures::stream::pending::<std::result::Result<Bytes, Infallible>>();
        let mut reader = TextReader::new(source).with_idle_timeout(Duration::from_millis(20));
        let err = reader.next_text().await.unwrap_err();
        assert!(matches!(err, StreamError::IdleTimeout(d) if d == Duration::from_millis(20)));
    }
}
