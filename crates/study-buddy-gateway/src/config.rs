//! Gateway configuration types.
//!
//! This module defines configuration structures for the HTTP gateway and
//! the upstream LLM endpoint it forwards to.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

/// Configuration for the gateway service.
#[derive(Clone, Deserialize)]
pub struct GatewayConfig {
    /// Listen address (e.g., "0.0.0.0:8080").
    #[serde(default = "GatewayConfig::default_listen_addr")]
    pub listen_addr: String,

    /// Allowed CORS origins.
    #[serde(default = "GatewayConfig::default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    #[serde(default = "GatewayConfig::default_max_body")]
    pub max_body_bytes: usize,

    /// Time allowed until response headers are sent, in seconds.
    #[serde(default = "GatewayConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Bearer keys accepted from clients. Empty means the gateway is open.
    #[serde(default)]
    pub client_keys: Vec<String>,

    /// Upstream LLM gateway.
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

impl GatewayConfig {
    fn default_listen_addr() -> String {
        "0.0.0.0:8080".to_string()
    }

    fn default_cors_origins() -> Vec<String> {
        vec!["*".to_string()]
    }

    const fn default_max_body() -> usize {
        1024 * 1024 // 1 MB
    }

    const fn default_request_timeout() -> u64 {
        60
    }

    /// Build a configuration from process environment variables.
    ///
    /// See [`GatewayConfig::from_lookup`] for the variables read.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from a variable lookup.
    ///
    /// Reads `LISTEN_ADDR`, `CORS_ORIGINS` and `CLIENT_KEYS` (comma
    /// separated), `UPSTREAM_URL`, `UPSTREAM_MODEL` and `UPSTREAM_API_KEY`.
    /// Unset or blank variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(addr) = get("LISTEN_ADDR") {
            config.listen_addr = addr;
        }
        if let Some(origins) = get("CORS_ORIGINS") {
            config.cors_origins = split_list(&origins);
        }
        if let Some(keys) = get("CLIENT_KEYS") {
            config.client_keys = split_list(&keys);
        }
        if let Some(url) = get("UPSTREAM_URL") {
            config.upstream.url = url;
        }
        if let Some(model) = get("UPSTREAM_MODEL") {
            config.upstream.model = model;
        }
        config.upstream.api_key = get("UPSTREAM_API_KEY");

        config
    }

    /// Get the request timeout as a `Duration`.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Whether clients must present one of the configured keys.
    #[must_use]
    pub fn requires_client_key(&self) -> bool {
        !self.client_keys.is_empty()
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: Self::default_listen_addr(),
            cors_origins: Self::default_cors_origins(),
            max_body_bytes: Self::default_max_body(),
            request_timeout_seconds: Self::default_request_timeout(),
            client_keys: Vec::new(),
            upstream: UpstreamConfig::default(),
        }
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("listen_addr", &self.listen_addr)
            .field("cors_origins", &self.cors_origins)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("client_keys", &self.client_keys.len())
            .field("upstream", &self.upstream)
            .finish()
    }
}

/// Configuration of the upstream chat-completions endpoint.
#[derive(Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Chat-completions URL.
    #[serde(default = "UpstreamConfig::default_url")]
    pub url: String,

    /// Model identifier sent with every request.
    #[serde(default = "UpstreamConfig::default_model")]
    pub model: String,

    /// Sampling temperature.
    #[serde(default = "UpstreamConfig::default_temperature")]
    pub temperature: f32,

    /// Nucleus sampling mass.
    #[serde(default = "UpstreamConfig::default_top_p")]
    pub top_p: f32,

    /// Bearer key for the upstream. Requests fail while it is unset.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Connect timeout in seconds.
    #[serde(default = "UpstreamConfig::default_connect_timeout")]
    pub connect_timeout_seconds: u64,

    /// Longest silence tolerated while collecting a non-streamed answer,
    /// in seconds.
    #[serde(default = "UpstreamConfig::default_idle_timeout")]
    pub idle_timeout_seconds: u64,
}

impl UpstreamConfig {
    fn default_url() -> String {
        "https://ai.gateway.lovable.dev/v1/chat/completions".to_string()
    }

    fn default_model() -> String {
        "google/gemini-3-flash-preview".to_string()
    }

    const fn default_temperature() -> f32 {
        0.8
    }

    const fn default_top_p() -> f32 {
        0.95
    }

    const fn default_connect_timeout() -> u64 {
        10
    }

    const fn default_idle_timeout() -> u64 {
        60
    }

    /// Get the connect timeout as a `Duration`.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    /// Get the idle timeout as a `Duration`.
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_seconds)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: Self::default_url(),
            model: Self::default_model(),
            temperature: Self::default_temperature(),
            top_p: Self::default_top_p(),
            api_key: None,
            connect_timeout_seconds: Self::default_connect_timeout(),
            idle_timeout_seconds: Self::default_idle_timeout(),
        }
    }
}

impl fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("url", &self.url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("connect_timeout_seconds", &self.connect_timeout_seconds)
            .field("idle_timeout_seconds", &self.idle_timeout_seconds)
            .finish()
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}
