//! Error types for stream reading.

use std::time::Duration;

use thiserror::Error;

/// A result type using `StreamError`.
pub type Result<T> = std::result::Result<T, StreamError>;

/// Errors that end a stream before it completes.
///
/// Framing problems are not errors: malformed frames are recovered by
/// re-buffering or skipped, and never surface here.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The underlying byte source failed (network error, aborted body).
    #[error("transport error: {0}")]
    Transport(String),

    /// No chunk arrived within the idle timeout.
    #[error("no data received for {}s", .0.as_secs())]
    IdleTimeout(Duration),
}
