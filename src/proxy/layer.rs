//! Tower middleware that sends non-local requests upstream.
//!
//! ```text
//! Received → classify(path) ─┬─ Local   → inner service (next handler)
//!                            └─ Proxied → Forwarder (inner never called)
//! ```

use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use futures_util::future::BoxFuture;
use percent_encoding::percent_decode_str;
use tower::{Layer, Service};

use crate::observability::metrics;
use crate::proxy::forwarder::Forwarder;
use crate::routing::{PathClassifier, Verdict};

/// Wraps a local handler chain with upstream fallback.
#[derive(Clone)]
pub struct FallbackLayer {
    classifier: PathClassifier,
    forwarder: Forwarder,
}

impl FallbackLayer {
    pub fn new(classifier: PathClassifier, forwarder: Forwarder) -> Self {
        Self {
            classifier,
            forwarder,
        }
    }
}

impl<S> Layer<S> for FallbackLayer {
    type Service = FallbackService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        FallbackService {
            inner,
            classifier: self.classifier.clone(),
            forwarder: self.forwarder.clone(),
        }
    }
}

/// Service produced by [`FallbackLayer`]. `S` is the next handler.
#[derive(Clone)]
pub struct FallbackService<S> {
    inner: S,
    classifier: PathClassifier,
    forwarder: Forwarder,
}

impl<S> Service<Request<Body>> for FallbackService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let start_time = Instant::now();
        let method = request.method().clone();
        // Classify the decoded path so `/%61pi` is treated like `/api`.
        let path = percent_decode_str(request.uri().path()).decode_utf8_lossy().into_owned();
        let verdict = self.classifier.classify(&path);

        tracing::debug!(
            method = %method,
            path = %path,
            verdict = %verdict,
            "Request classified"
        );

        match verdict {
            Verdict::Local => {
                // Take the service that was driven to readiness and leave a
                // fresh clone behind for the next call.
                let clone = self.inner.clone();
                let mut inner = std::mem::replace(&mut self.inner, clone);
                Box::pin(async move {
                    let response = inner.call(request).await?;
                    metrics::record_request(verdict, &method, response.status(), start_time);
                    Ok(response)
                })
            }
            Verdict::Proxied => {
                let forwarder = self.forwarder.clone();
                Box::pin(async move {
                    let response = forwarder.forward(request).await;
                    metrics::record_request(verdict, &method, response.status(), start_time);
                    Ok(response)
                })
            }
        }
    }
}
