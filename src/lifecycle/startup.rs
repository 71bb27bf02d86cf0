//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use crate::geo::{setup_geo_router, DadataClient, GeoError};
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::spawn_signal_handler;
use crate::observability::metrics;
use crate::proxy::ProxyError;

/// Fatal startup or serve failure.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Upstream(#[from] ProxyError),

    #[error(transparent)]
    Geo(#[from] GeoError),

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Build every subsystem from a validated config and serve until a stop signal.
pub async fn run(config: GatewayConfig) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    if config.geo.api_key.is_empty() {
        tracing::warn!("geo.api_key is empty; address lookups will be rejected by the provider");
    }
    let provider = Arc::new(DadataClient::new(&config.geo)?);
    let local = setup_geo_router(provider);

    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config, local)?;

    let listener = TcpListener::bind(&bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            addr: bind_address.clone(),
            source,
        })?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    spawn_signal_handler(shutdown);

    server.run(listener, server_shutdown).await?;
    Ok(())
}
