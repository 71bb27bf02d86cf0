//! Transparent forwarding to the upstream origin.
//!
//! A proxied request is rebuilt against the upstream target with the same
//! method, path, query and body, sent once, and the upstream response is
//! relayed back. Bodies are streamed in both directions; nothing is buffered.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::{Body, HttpBody};
use axum::extract::ConnectInfo;
use axum::http::{header, Request};
use axum::response::{IntoResponse, Response};
use futures_util::StreamExt;
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::sync::oneshot;

use crate::config::GatewayConfig;
use crate::http::request::RequestIdExt;
use crate::observability::metrics;
use crate::proxy::error::ProxyError;
use crate::proxy::headers::{add_forwarded_headers, strip_hop_by_hop};
use crate::proxy::upstream::UpstreamTarget;

/// Tunables for the upstream hop.
#[derive(Debug, Clone)]
pub struct ForwarderSettings {
    pub connect_timeout: Duration,
    /// Deadline for the upstream response head, counted from the end of
    /// the request body.
    pub upstream_timeout: Duration,
    /// Maximum silence between body chunks, in either direction.
    pub idle_timeout: Duration,
    pub forwarded_headers: bool,
    pub pool_idle_per_host: usize,
}

impl Default for ForwarderSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            upstream_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(60),
            forwarded_headers: true,
            pool_idle_per_host: 32,
        }
    }
}

impl ForwarderSettings {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(config.timeouts.connect_secs),
            upstream_timeout: Duration::from_secs(config.timeouts.upstream_secs),
            idle_timeout: Duration::from_secs(config.timeouts.idle_secs),
            forwarded_headers: config.upstream.forwarded_headers,
            pool_idle_per_host: config.upstream.pool_idle_per_host,
        }
    }
}

/// Relays requests to a single upstream. Cheap to clone; clones share the
/// connection pool and the immutable target.
#[derive(Clone)]
pub struct Forwarder {
    target: Arc<UpstreamTarget>,
    settings: Arc<ForwarderSettings>,
    client: Client<HttpConnector, Body>,
}

impl Forwarder {
    pub fn new(target: UpstreamTarget, settings: ForwarderSettings) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(settings.connect_timeout));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(settings.pool_idle_per_host)
            .build(connector);

        Self {
            target: Arc::new(target),
            settings: Arc::new(settings),
            client,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Result<Self, ProxyError> {
        let target = UpstreamTarget::from_config(&config.upstream)?;
        Ok(Self::new(target, ForwarderSettings::from_config(config)))
    }

    pub fn target(&self) -> &UpstreamTarget {
        &self.target
    }

    /// Forward `request` and always produce a response: upstream failures
    /// become 502/504 instead of errors.
    pub async fn forward(&self, request: Request<Body>) -> Response {
        let request_id = request.request_id().to_string();
        let start_time = Instant::now();

        match self.try_forward(request).await {
            Ok(response) => {
                tracing::debug!(
                    request_id = %request_id,
                    upstream = %self.target,
                    status = %response.status(),
                    elapsed_ms = start_time.elapsed().as_millis() as u64,
                    "Upstream responded"
                );
                response
            }
            Err(e) => {
                tracing::warn!(
                    request_id = %request_id,
                    upstream = %self.target,
                    error = %e,
                    "Upstream error"
                );
                metrics::record_upstream_error(e.kind());
                e.into_response()
            }
        }
    }

    pub async fn try_forward(&self, request: Request<Body>) -> Result<Response, ProxyError> {
        let (parts, body) = request.into_parts();

        let uri = self.target.uri_for(&parts.uri)?;
        let client_ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        let mut headers = parts.headers;
        let original_host = headers.get(header::HOST).cloned();
        strip_hop_by_hop(&mut headers);
        headers.insert(header::HOST, self.target.host_header());
        if self.settings.forwarded_headers {
            add_forwarded_headers(&mut headers, client_ip, original_host);
        }

        let (body, uploaded) = upload_bounded(body, self.settings.idle_timeout);
        let mut outbound = Request::builder()
            .method(parts.method)
            .uri(uri)
            .body(body)?;
        *outbound.headers_mut() = headers;

        tracing::trace!(uri = %outbound.uri(), method = %outbound.method(), "Sending upstream request");

        let response = self.client.request(outbound);
        tokio::pin!(response);

        // The head deadline starts once the body is sent; an upstream may
        // still answer early (e.g. 413) while the upload is in progress.
        let response = tokio::select! {
            result = &mut response => result,
            _ = uploaded => {
                tokio::time::timeout(self.settings.upstream_timeout, &mut response)
                    .await
                    .map_err(|_| ProxyError::Timeout(self.settings.upstream_timeout))?
            }
        }
        .map_err(ProxyError::from_client)?;

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);

        Ok(Response::from_parts(
            parts,
            idle_bounded(body, self.settings.idle_timeout),
        ))
    }
}

/// Stream the client body upstream, aborting it if no chunk arrives within
/// `idle`.
///
/// The receiver resolves once the body is finished: fully read, failed, or
/// dropped by the connection after the last declared byte. Known-empty
/// bodies pass through untouched so no chunked framing is added.
fn upload_bounded(body: Body, idle: Duration) -> (Body, oneshot::Receiver<()>) {
    let (done, uploaded) = oneshot::channel();
    if body.is_end_stream() {
        let _ = done.send(());
        return (body, uploaded);
    }

    let chunks = body.into_data_stream();
    let stream = futures_util::stream::unfold(Some((chunks, done)), move |state| async move {
        let (mut chunks, done) = state?;
        match tokio::time::timeout(idle, chunks.next()).await {
            Ok(Some(Ok(chunk))) => Some((Ok(chunk), Some((chunks, done)))),
            Ok(Some(Err(e))) => Some((Err(e), None)),
            Ok(None) => {
                let _ = done.send(());
                None
            }
            Err(_) => {
                tracing::warn!(idle_ms = idle.as_millis() as u64, "Client upload stalled, aborting");
                Some((Err(axum::Error::new(ProxyError::Timeout(idle))), None))
            }
        }
    });
    (Body::from_stream(stream), uploaded)
}

/// Stream the upstream body, aborting it if no chunk arrives within `idle`.
///
/// The status line is already on the wire by then, so the only way to report
/// the stall is to end the body with an error, which makes the server drop
/// the client connection.
fn idle_bounded(body: Incoming, idle: Duration) -> Body {
    let chunks = Body::new(body).into_data_stream();
    let stream = futures_util::stream::unfold(Some(chunks), move |state| async move {
        let mut chunks = state?;
        match tokio::time::timeout(idle, chunks.next()).await {
            Ok(Some(chunk)) => Some((chunk, Some(chunks))),
            Ok(None) => None,
            Err(_) => {
                tracing::warn!(idle_ms = idle.as_millis() as u64, "Upstream body stalled, aborting");
                Some((Err(axum::Error::new(ProxyError::Timeout(idle))), None))
            }
        }
    });
    Body::from_stream(stream)
}
