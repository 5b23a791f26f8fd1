//! # study-buddy-cli
//!
//! Terminal front-end for the study-buddy tutor.
//!
//! The CLI sends the whole conversation to the gateway on every turn and
//! streams the reply back, printing it as it arrives. Finished replies are
//! rendered once more, as a diagram, a bar chart, or Markdown.
//!
//! ```text
//! REPL ──submit──► App ──POST /v1/chat──► gateway
//!   ▲               ▲                        │
//!   │ Update        │ ChatEvent              │ SSE bytes
//!   └───────────────┴──── stream task ◄──────┘
//! ```
//!
//! ## Modules
//!
//! - [`app`]: conversation state, turns, and event handling
//! - [`client`]: HTTP client for the gateway
//! - [`error`]: client errors and their remediation text
//! - [`render`]: diagram, chart, and Markdown rendering
//! - [`speech`]: optional narration of replies
//! - [`stream`]: the per-turn reading task
//! - [`types`]: request and response bodies

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod app;
pub mod client;
pub mod error;
pub mod render;
pub mod speech;
pub mod stream;
pub mod types;

pub use app::{welcome_message, App, Update, DEFAULT_IDLE_TIMEOUT, SUGGESTED_QUESTIONS};
pub use client::ChatClient;
pub use error::ClientError;
pub use render::{classify, render, ChartData, Content, RenderSink, TerminalSink};
pub use speech::{Capability, CommandNarrator, Narrator, SpeechError};
pub use stream::{spawn_stream, ChatEvent};
pub use types::{
    ChatRequest, CommunicationStyle, ExplainLevel, ExplainRequest, HealthStatus, TutorSettings,
};
