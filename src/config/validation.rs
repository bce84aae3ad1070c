//! Configuration validation.
//!
//! Serde handles syntax; this checks values. All problems are reported at
//! once rather than stopping at the first.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::normalize::reasoning::UNDEFINED_SENTINEL;

/// A single semantic problem with a loaded config.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),
    #[error("upstream.host must not be empty")]
    EmptyHost,
    #[error("upstream.host {0:?} must not contain a scheme, port or path")]
    HostShape(String),
    #[error("upstream.port must be non-zero")]
    ZeroPort,
    #[error("upstream.scheme {0:?} must be http or https")]
    Scheme(String),
    #[error("normalizer.model_triggers must contain at least one non-empty entry")]
    NoTriggers,
    #[error("normalizer.reasoning_placeholder {0:?} must be non-empty and not \"[undefined]\"")]
    Placeholder(String),
    #[error("observability.metrics_address {0:?} is not a socket address")]
    MetricsAddress(String),
}

/// Check a config, returning every error found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    let upstream = &config.upstream;
    if upstream.host.is_empty() {
        errors.push(ValidationError::EmptyHost);
    } else if upstream.host.contains(['/', ':', ' ']) {
        errors.push(ValidationError::HostShape(upstream.host.clone()));
    }
    if upstream.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }
    if !matches!(upstream.scheme.as_str(), "http" | "https") {
        errors.push(ValidationError::Scheme(upstream.scheme.clone()));
    }

    if config.normalizer.model_triggers.iter().all(|t| t.is_empty()) {
        errors.push(ValidationError::NoTriggers);
    }

    let placeholder = &config.normalizer.reasoning_placeholder;
    if placeholder.is_empty() || placeholder == UNDEFINED_SENTINEL {
        errors.push(ValidationError::Placeholder(placeholder.clone()));
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
