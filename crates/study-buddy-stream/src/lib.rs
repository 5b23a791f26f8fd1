//! Streaming chat-response core for study-buddy.
//!
//! Turns the byte stream of an OpenAI-style chat-completion response into a
//! live-updating assistant message:
//!
//! ```text
//! bytes ──► TextReader ──► SseParser ──► MessageAssembler ──► Conversation
//!           (UTF-8 state)   (lines, frames,   (running text,
//!                            split-JSON carry)  replace-or-append)
//! ```
//!
//! - **Decoding**: [`Utf8StreamDecoder`] keeps multi-byte characters intact
//!   across chunk boundaries
//! - **Framing**: [`SseParser`] classifies `data:` lines, comments and the
//!   `[DONE]` sentinel and recovers JSON payloads split by a newline
//! - **Assembly**: [`MessageAssembler`] mirrors the running text into the
//!   conversation's tail
//! - **Sessions**: [`SessionSlot`] keeps at most one live stream per
//!   conversation
//!
//! # Example
//!
//! ```
//! use study_buddy_core::Conversation;
//! use study_buddy_stream::{MessageAssembler, SseParser};
//!
//! let mut parser = SseParser::new();
//! let mut assembler = MessageAssembler::new();
//! let mut conversation = Conversation::new();
//! conversation.push_user("hi").unwrap();
//!
//! for chunk in [
//!     r#"data: {"choices":[{"delta":{"content":"Hel"#,
//!     "lo\"}}]}\n",
//!     "data: {\"choices\":[{\"delta\":{\"content\":\" world\"}}]}\ndata: [DONE]\n",
//! ] {
//!     for delta in parser.feed(chunk) {
//!         assembler.apply(&delta, &mut conversation);
//!     }
//! }
//!
//! assert!(parser.is_done());
//! assert_eq!(assembler.updates(), 2);
//! assert_eq!(assembler.finish(), "Hello world");
//! assert_eq!(conversation.len(), 2);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod assembler;
pub mod decoder;
pub mod delta;
pub mod error;
pub mod prose;
pub mod reader;
pub mod session;
pub mod sse;

pub use assembler::MessageAssembler;
pub use decoder::Utf8StreamDecoder;
pub use delta::DeltaReader;
pub use error::{Result, StreamError};
pub use prose::narration_text;
pub use reader::TextReader;
pub use session::{SessionSlot, SessionTicket, StreamSession};
pub use sse::{classify_line, Frame, ParserStats, SseParser, MAX_CARRY_BYTES, MAX_LINE_BYTES};
