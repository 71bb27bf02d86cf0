//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Wrap the local handler chain with the upstream fallback layer
//! - Wire up middleware (tracing, request ID, local API timeout)
//! - Bind server to listener
//! - Graceful shutdown

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::Layer;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::http::request::{propagate_request_id_layer, request_span, set_request_id_layer};
use crate::proxy::{FallbackLayer, Forwarder, ProxyError};
use crate::routing::PathClassifier;

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a server that serves `local` for local paths and proxies the
    /// rest to the configured upstream.
    pub fn new(config: GatewayConfig, local: Router) -> Result<Self, ProxyError> {
        let classifier = PathClassifier::from_config(&config.routing);
        let forwarder = Forwarder::from_config(&config)?;

        tracing::info!(
            upstream = %forwarder.target(),
            local_prefixes = ?config.routing.local_prefixes,
            "Upstream fallback configured"
        );

        let router = Self::build_router(&config, classifier, forwarder, local);
        Ok(Self { router })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(
        config: &GatewayConfig,
        classifier: PathClassifier,
        forwarder: Forwarder,
        local: Router,
    ) -> Router {
        let local = local.layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.api_secs)));
        let gateway = FallbackLayer::new(classifier, forwarder).layer(local);

        Router::new()
            .fallback_service(gateway)
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(request_span::<Body>))
            .layer(set_request_id_layer())
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
