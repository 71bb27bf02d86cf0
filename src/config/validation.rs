//! Configuration validation.
//!
//! Serde handles syntax; this module checks values that parse but make no
//! sense at runtime. All problems are reported together, not just the first.

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("upstream.host must not be empty")]
    EmptyUpstreamHost,

    #[error("upstream.port must be non-zero")]
    ZeroUpstreamPort,

    #[error("routing.local_prefixes: {0:?} must start with '/'")]
    InvalidPrefix(String),

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("geo.base_url: {0}")]
    InvalidGeoUrl(String),
}

/// Validate a configuration, returning every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.upstream.host.trim().is_empty() {
        errors.push(ValidationError::EmptyUpstreamHost);
    }
    if config.upstream.port == 0 {
        errors.push(ValidationError::ZeroUpstreamPort);
    }

    for prefix in &config.routing.local_prefixes {
        if !prefix.starts_with('/') {
            errors.push(ValidationError::InvalidPrefix(prefix.clone()));
        }
    }

    let timeouts = &config.timeouts;
    for (name, value) in [
        ("timeouts.connect_secs", timeouts.connect_secs),
        ("timeouts.upstream_secs", timeouts.upstream_secs),
        ("timeouts.idle_secs", timeouts.idle_secs),
        ("timeouts.api_secs", timeouts.api_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout(name));
        }
    }
    if config.geo.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("geo.request_timeout_secs"));
    }

    match Url::parse(&config.geo.base_url) {
        Ok(url) if !url.path().ends_with('/') => {
            errors.push(ValidationError::InvalidGeoUrl("must end with '/'".to_string()));
        }
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::InvalidGeoUrl(e.to_string())),
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
