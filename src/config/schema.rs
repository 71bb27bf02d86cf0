//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Deserializer, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Fallback origin that receives every non-local request.
    pub upstream: UpstreamConfig,

    /// Which paths stay in the local handler chain.
    pub routing: RoutingConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Geocoding provider settings.
    pub geo: GeoConfig,

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

/// Upstream (fallback origin) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream host name or IP address.
    pub host: String,

    /// Upstream port. Accepts either `1313` or `"1313"` in config files.
    #[serde(deserialize_with = "port_from_str_or_int")]
    pub port: u16,

    /// Add X-Forwarded-For / -Host / -Proto to proxied requests.
    pub forwarded_headers: bool,

    /// Idle pooled connections kept per upstream host. Zero opens a fresh
    /// connection for every proxied request.
    pub pool_idle_per_host: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            host: "hugo".to_string(),
            port: 1313,
            forwarded_headers: true,
            pool_idle_per_host: 32,
        }
    }
}

/// Path routing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Path prefixes served by the local handler chain. Matched on whole
    /// path segments; everything else is proxied upstream.
    pub local_prefixes: Vec<String>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            local_prefixes: vec!["/api".to_string()],
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed for the upstream to produce its response head, in seconds.
    pub upstream_secs: u64,

    /// Maximum gap between upstream body chunks in seconds.
    pub idle_secs: u64,

    /// Request timeout for the local API routes in seconds.
    pub api_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 30,
            idle_secs: 60,
            api_secs: 30,
        }
    }
}

/// Geocoding provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GeoConfig {
    /// Base URL of the suggestions API. Must end with a slash.
    pub base_url: String,

    /// API key sent as `Authorization: Token <key>`.
    pub api_key: String,

    /// Secret key sent as `X-Secret` when non-empty.
    pub secret_key: String,

    /// Timeout for a single provider call in seconds.
    pub request_timeout_secs: u64,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            base_url: "https://suggestions.dadata.ru/suggestions/api/4_1/rs/".to_string(),
            api_key: String::new(),
            secret_key: String::new(),
            request_timeout_secs: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortRepr {
    Int(u64),
    Str(String),
}

fn port_from_str_or_int<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let raw = match PortRepr::deserialize(deserializer)? {
        PortRepr::Int(n) => n,
        PortRepr::Str(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| D::Error::custom(format!("invalid port {:?}", s)))?,
    };
    u16::try_from(raw).map_err(|_| D::Error::custom(format!("port {} out of range", raw)))
}
