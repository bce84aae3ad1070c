//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Every field has a default so an empty file is a valid config.

use serde::{Deserialize, Serialize};

/// Root configuration for the shim.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Where normalized requests are sent.
    pub upstream: UpstreamConfig,

    /// Payload normalization settings.
    pub normalizer: NormalizerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream chat-completion host.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Hostname, without scheme or port.
    pub host: String,

    /// Port (443 for the real upstream).
    pub port: u16,

    /// "https", or "http" for local testing.
    pub scheme: String,

    /// Connection establishment timeout in seconds. Unset leaves the
    /// transport default in place.
    pub connect_timeout_secs: Option<u64>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            host: "api.moonshot.ai".to_string(),
            port: 443,
            scheme: "https".to_string(),
            connect_timeout_secs: None,
        }
    }
}

impl UpstreamConfig {
    /// Base URL requests are joined onto, e.g. `https://api.moonshot.ai:443`.
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

/// Normalizer settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Case-insensitive substrings of `model` that enable parameter pinning.
    pub model_triggers: Vec<String>,

    /// Text written into missing or unusable `reasoning_content`. The
    /// upstream rejects the empty string, hence a single space.
    pub reasoning_placeholder: String,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            model_triggers: vec!["kimi".to_string(), "moonshot".to_string()],
            reasoning_placeholder: " ".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
