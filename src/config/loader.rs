//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::ValidationError;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {value:?}")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub const ENV_UPSTREAM_HOST: &str = "GATEWAY_UPSTREAM_HOST";
pub const ENV_UPSTREAM_PORT: &str = "GATEWAY_UPSTREAM_PORT";
pub const ENV_BIND_ADDRESS: &str = "GATEWAY_BIND_ADDRESS";
pub const ENV_API_KEY: &str = "DADATA_API_KEY";
pub const ENV_SECRET_KEY: &str = "DADATA_SECRET_KEY";

/// Parse a TOML file into a configuration without validating it.
pub fn read_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Overlay environment variables onto `config`.
///
/// `lookup` is `std::env::var(..).ok()` in production; tests pass a map.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup(ENV_UPSTREAM_HOST) {
        config.upstream.host = host;
    }
    if let Some(port) = lookup(ENV_UPSTREAM_PORT) {
        config.upstream.port = port.trim().parse().map_err(|_| ConfigError::Env {
            var: ENV_UPSTREAM_PORT,
            value: port,
        })?;
    }
    if let Some(addr) = lookup(ENV_BIND_ADDRESS) {
        config.listener.bind_address = addr;
    }
    if let Some(key) = lookup(ENV_API_KEY) {
        config.geo.api_key = key;
    }
    if let Some(secret) = lookup(ENV_SECRET_KEY) {
        config.geo.secret_key = secret;
    }
    Ok(())
}
