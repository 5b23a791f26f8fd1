//! Core types and utilities for study-buddy.
//!
//! This crate provides the foundational types shared by the gateway, the
//! streaming core and the terminal front-end:
//!
//! - **Conversation**: roles, messages and the append-only message list
//! - **Identifiers**: stream session identities and client fingerprints
//! - **Error types**: common error definitions shared across crates
//!
//! # Example
//!
//! ```
//! use study_buddy_core::{Conversation, Role, Upsert};
//!
//! let mut conversation = Conversation::new();
//! conversation.push_user("What is photosynthesis?").unwrap();
//!
//! // Streaming replies grow the trailing assistant message in place.
//! assert_eq!(conversation.upsert_assistant("Plants"), Upsert::Appended);
//! assert_eq!(conversation.upsert_assistant("Plants turn light"), Upsert::Replaced);
//!
//! let last = conversation.last().unwrap();
//! assert_eq!(last.role, Role::Assistant);
//! assert_eq!(last.content, "Plants turn light");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod ids;
pub mod message;

pub use error::{CoreError, Result};
pub use ids::{ClientFingerprint, IdError, StreamId};
pub use message::{Conversation, ConversationMessage, Role, Upsert};
