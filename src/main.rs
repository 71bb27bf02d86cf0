//! Geo gateway
//!
//! Serves the geocoding API locally and forwards every other path to a
//! fallback origin, so both appear as one host.
//!
//! ```text
//!                        ┌───────────────────────────────────────────┐
//!     Client Request     │  request id → trace → classify(path)      │
//!     ───────────────────┼─▶                        │                │
//!                        │            ┌─────────────┴─────────┐      │
//!                        │            ▼                       ▼      │
//!                        │     /api/* (local)          anything else │
//!                        │     geo handlers            forwarder ────┼──▶ Upstream
//!                        │            │                       │      │    (host:port)
//!     Client Response    │            ▼                       ▼      │
//!     ◀──────────────────┼──── response ◀──────── streamed response ◀┼───
//!                        └───────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use geo_gateway::config::{self, GatewayConfig};
use geo_gateway::lifecycle::startup;
use geo_gateway::observability::logging;

#[derive(Parser)]
#[command(name = "geo-gateway")]
#[command(about = "Geocoding API with transparent fallback to an upstream origin", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:8080.
    #[arg(long)]
    bind: Option<String>,

    /// Upstream host that receives non-API requests.
    #[arg(long)]
    upstream_host: Option<String>,

    /// Upstream port.
    #[arg(long)]
    upstream_port: Option<u16>,
}

impl Cli {
    fn resolve_config(&self) -> Result<GatewayConfig, config::ConfigError> {
        let mut config = match &self.config {
            Some(path) => config::read_config(path)?,
            None => GatewayConfig::default(),
        };

        config::apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;

        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
        if let Some(host) = &self.upstream_host {
            config.upstream.host = host.clone();
        }
        if let Some(port) = self.upstream_port {
            config.upstream.port = port;
        }

        config::validate_config(&config).map_err(config::ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    logging::init_logging(&config.observability)?;

    tracing::info!("geo-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream_host = %config.upstream.host,
        upstream_port = config.upstream.port,
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
