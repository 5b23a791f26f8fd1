//! Gateway application state.
//!
//! This module defines the shared state that is available to all request handlers.

use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::upstream::CompletionUpstream;

/// Shared application state for the gateway.
pub struct GatewayState<U>
where
    U: CompletionUpstream,
{
    /// The LLM endpoint completions are forwarded to.
    pub upstream: Arc<U>,
    /// Gateway configuration.
    pub config: GatewayConfig,
}

impl<U> GatewayState<U>
where
    U: CompletionUpstream,
{
    /// Create a new gateway state.
    #[must_use]
    pub fn new(upstream: Arc<U>, config: GatewayConfig) -> Self {
        Self { upstream, config }
    }
}

impl<U> Clone for GatewayState<U>
where
    U: CompletionUpstream,
{
    fn clone(&self) -> Self {
        Self {
            upstream: Arc::clone(&self.upstream),
            config: self.config.clone(),
        }
    }
}
