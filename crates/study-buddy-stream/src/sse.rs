//! Server-sent event line framing for chat-completion streams.
//!
//! The upstream emits OpenAI-style frames:
//!
//! ```text
//! : keep-alive
//! data: {"choices":[{"delta":{"content":"Hel"}}]}
//!
//! data: {"choices":[{"delta":{"content":"lo"}}]}
//! data: [DONE]
//! ```
//!
//! Text is accumulated in a pending buffer and split on `\n`; a line longer
//! than [`MAX_LINE_BYTES`] is dropped. Each complete line is classified into
//! a [`Frame`]. A `data:` line whose JSON does not parse is not discarded: it
//! is held as a carry and re-tried merged with the following line, while
//! later lines keep being processed.

use serde_json::Value;

/// Prefix that marks a content frame.
pub const DATA_PREFIX: &str = "data: ";

/// Payload that terminates the stream's content.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Largest carried payload before it is given up on.
pub const MAX_CARRY_BYTES: usize = 64 * 1024;

/// Longest unterminated line held while waiting for its `\n`. The rest of
/// a longer line is discarded up to the next newline.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// JSON pointer to the text fragment inside a chunk object.
const DELTA_POINTER: &str = "/choices/0/delta/content";

/// Classification of one protocol line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Empty or whitespace-only line (frame separator).
    Blank,
    /// `:`-prefixed comment line, such as a keep-alive.
    Comment(String),
    /// Non-empty line that is neither a comment nor a `data: ` line.
    Unrecognized,
    /// `data: [DONE]`.
    Done,
    /// `data:` frame carrying a non-empty text fragment.
    Delta(String),
    /// Well-formed `data:` frame without text (role announcement, finish
    /// reason, usage block).
    Empty,
    /// `data:` frame whose payload is not valid JSON (yet).
    Malformed(String),
}

impl Frame {
    /// Whether this line begins a new frame, as opposed to possibly
    /// continuing a payload that was cut by a newline.
    const fn starts_frame(&self) -> bool {
        !matches!(self, Self::Unrecognized)
    }
}

/// Classify a single line (without its `\n`).
///
/// A single trailing `\r` is ignored.
#[must_use]
pub fn classify_line(line: &str) -> Frame {
    let line = line.strip_suffix('\r').unwrap_or(line);

    if line.trim().is_empty() {
        return Frame::Blank;
    }
    if let Some(comment) = line.strip_prefix(':') {
        return Frame::Comment(comment.trim().to_string());
    }
    match line.strip_prefix(DATA_PREFIX) {
        Some(payload) => classify_payload(payload.trim()),
        None => Frame::Unrecognized,
    }
}

fn classify_payload(payload: &str) -> Frame {
    if payload == DONE_SENTINEL {
        return Frame::Done;
    }

    match serde_json::from_str::<Value>(payload) {
        Ok(value) => match value.pointer(DELTA_POINTER).and_then(Value::as_str) {
            Some(content) if !content.is_empty() => Frame::Delta(content.to_string()),
            _ => Frame::Empty,
        },
        Err(_) => Frame::Malformed(payload.to_string()),
    }
}

/// Counters describing what a parser has seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserStats {
    /// Complete lines processed.
    pub lines: usize,
    /// Content deltas emitted.
    pub deltas: usize,
    /// Comment lines skipped.
    pub comments: usize,
    /// Blank and unrecognized lines skipped.
    pub ignored: usize,
    /// Payloads recovered by merging a carry with a following line.
    pub recovered: usize,
    /// Carried payloads and over-long lines given up on.
    pub dropped: usize,
}

/// Incremental parser turning decoded text into content deltas.
#[derive(Debug, Default)]
pub struct SseParser {
    pending: String,
    carry: Option<String>,
    discarding: bool,
    done: bool,
    stats: ParserStats,
}

impl SseParser {
    /// Create an empty parser.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append decoded text and return the deltas of every complete line, in
    /// arrival order.
    ///
    /// Once `[DONE]` has been seen all further input is ignored.
    pub fn feed(&mut self, text: &str) -> Vec<String> {
        let mut deltas = Vec::new();
        if self.done {
            return deltas;
        }

        let text = if self.discarding {
            let Some(newline) = text.find('\n') else {
                return deltas;
            };
            self.discarding = false;
            &text[newline + 1..]
        } else {
            text
        };

        // What is already pending holds no newline, so scanning starts at
        // the new text.
        let mut pending = std::mem::take(&mut self.pending);
        let mut scan_from = pending.len();
        pending.push_str(text);

        let mut consumed = 0;
        while let Some(offset) = pending[scan_from..].find('\n') {
            let end = scan_from + offset;
            self.process_line(&pending[consumed..end], &mut deltas);
            consumed = end + 1;
            scan_from = consumed;
            if self.done {
                return deltas;
            }
        }
        pending.drain(..consumed);

        if pending.len() > MAX_LINE_BYTES {
            self.stats.dropped += 1;
            tracing::debug!(bytes = pending.len(), "Line exceeded limit, dropping");
            pending.clear();
            self.discarding = true;
        }
        self.pending = pending;
        deltas
    }

    /// End-of-stream flush.
    ///
    /// The partial final line (one that never got its `\n`) goes through the
    /// same classification. Anything still unparsable is dropped silently.
    pub fn finish(&mut self) -> Vec<String> {
        let mut deltas = Vec::new();
        let rest = std::mem::take(&mut self.pending);
        self.discarding = false;
        if !self.done && !rest.is_empty() {
            self.process_line(&rest, &mut deltas);
        }

        if let Some(carry) = self.carry.take() {
            self.stats.dropped += 1;
            tracing::debug!(bytes = carry.len(), "Dropping unparsable frame at end of stream");
        }
        deltas
    }

    /// Whether the `[DONE]` sentinel has been seen.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.done
    }

    /// Whether text is buffered that has not resolved into a frame yet.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty() || self.carry.is_some()
    }

    /// Counters accumulated so far.
    #[must_use]
    pub const fn stats(&self) -> ParserStats {
        self.stats
    }

    fn process_line(&mut self, line: &str, deltas: &mut Vec<String>) {
        let line = line.strip_suffix('\r').unwrap_or(line);
        self.stats.lines += 1;

        let Some(carry) = self.carry.take() else {
            self.handle_frame(classify_line(line), deltas);
            return;
        };

        let merged = format!("{carry}\n{line}");
        match classify_payload(merged.trim()) {
            Frame::Malformed(_) => {}
            frame => {
                self.stats.recovered += 1;
                self.handle_frame(frame, deltas);
                return;
            }
        }

        let frame = classify_line(line);
        if frame.starts_frame() {
            self.stats.dropped += 1;
            tracing::debug!(bytes = carry.len(), "Dropping unparsable frame");
            self.handle_frame(frame, deltas);
        } else if merged.len() > MAX_CARRY_BYTES {
            self.stats.dropped += 1;
            tracing::debug!(bytes = merged.len(), "Carried frame exceeded limit, dropping");
        } else {
            self.carry = Some(merged);
        }
    }

    fn handle_frame(&mut self, frame: Frame, deltas: &mut Vec<String>) {
        match frame {
            Frame::Blank | Frame::Unrecognized => self.stats.ignored += 1,
            Frame::Comment(_) => self.stats.comments += 1,
            Frame::Done => self.done = true,
            Frame::Delta(text) => {
                self.stats.deltas += 1;
                deltas.push(text);
            }
            Frame::Empty => {}
            Frame::Malformed(payload) => self.carry = Some(payload),
        }
    }
}
