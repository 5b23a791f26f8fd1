//! Common error types for study-buddy.
//!
//! This module provides shared error types that are used across multiple crates.

use thiserror::Error;

/// A result type using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core errors that can occur throughout the study-buddy system.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A message was empty or contained only whitespace.
    #[error("message must not be empty")]
    EmptyMessage,

    /// An invalid identifier was provided.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] crate::ids::IdError),
}
