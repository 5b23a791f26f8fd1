//! Client errors and the chat turns that explain them.
//!
//! Nothing that stops a turn is swallowed: every [`ClientError`] becomes an
//! assistant message via [`ClientError::remediation`].

use study_buddy_stream::StreamError;
use thiserror::Error;

/// Errors that can end a chat or explain request.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The gateway answered 404, so the chat endpoint is not there.
    #[error("chat endpoint not found")]
    NotDeployed,

    /// The gateway answered 401 or 403.
    #[error("authentication failed")]
    Unauthorized,

    /// The gateway answered 429.
    #[error("rate limited")]
    RateLimited,

    /// The gateway answered 402.
    #[error("usage quota exceeded")]
    QuotaExceeded,

    /// Any other non-success status.
    #[error("gateway error ({status}): {message}")]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Message from the gateway's error body, if it had one.
        message: String,
    },

    /// The request could not be sent or the connection dropped.
    #[error("transport error: {0}")]
    Transport(String),

    /// A success status with nothing to read.
    #[error("no response received from server")]
    NoBody,

    /// A response body that could not be decoded.
    #[error("invalid response: {0}")]
    Parse(String),

    /// The reply stream failed part way.
    #[error(transparent)]
    Stream(#[from] StreamError),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

const SETUP_STEPS: &str = "**How to fix this:**\n\n\
1. Make sure the gateway is running:\n   `study-buddy-gateway`\n\n\
2. Give the gateway an upstream key:\n   `UPSTREAM_API_KEY='your-key' study-buddy-gateway`\n\n\
3. Point the CLI at it:\n   `--gateway` / `STUDY_BUDDY_GATEWAY` and `--token` / `STUDY_BUDDY_TOKEN`";

impl ClientError {
    /// Whether the error points at a setup problem rather than a passing one.
    #[must_use]
    pub const fn is_setup_problem(&self) -> bool {
        matches!(
            self,
            Self::NotDeployed | Self::Unauthorized | Self::Transport(_) | Self::Upstream { .. }
        )
    }

    /// Human-readable Markdown explaining what went wrong, shown as a chat turn.
    #[must_use]
    pub fn remediation(&self) -> String {
        let message = match self {
            Self::NotDeployed => {
                "The Study Buddy gateway has no chat endpoint at this address. \
                 Check that `--gateway` points at a running `study-buddy-gateway`."
                    .to_string()
            }
            Self::Unauthorized => "Authentication failed. Check that `--token` matches one of the \
                 gateway's `CLIENT_KEYS` and that `UPSTREAM_API_KEY` is set on the gateway."
                .to_string(),
            Self::RateLimited => "Too many requests. Please wait a moment and try again.".to_string(),
            Self::QuotaExceeded => {
                "AI usage limit reached. Please add credits to continue.".to_string()
            }
            Self::Upstream { status, message } => {
                format!("The gateway answered with status {status}: {message}")
            }
            Self::Transport(detail) => format!("Failed to connect to the gateway ({detail})."),
            Self::NoBody => "No response received from server.".to_string(),
            Self::Parse(detail) => format!("The gateway sent a response I could not read ({detail})."),
            Self::Stream(StreamError::IdleTimeout(after)) => format!(
                "The answer stopped arriving (nothing received for {}s). Please try again.",
                after.as_secs()
            ),
            Self::Stream(StreamError::Transport(detail)) => {
                format!("The connection dropped while the answer was arriving ({detail}). Please try again.")
            }
        };

        if self.is_setup_problem() {
            format!("⚠️ **Connection Error**\n\n{message}\n\n{SETUP_STEPS}")
        } else {
            format!("⚠️ {message}")
        }
    }
}
