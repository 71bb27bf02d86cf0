//! Forwarding errors and their HTTP mapping.

use std::error::Error as StdError;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors that can occur while relaying a request upstream.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Host/port pair does not form a usable URI authority.
    #[error("invalid upstream target {0:?}")]
    InvalidTarget(String),

    /// TCP connect failed (DNS, refused, connect timeout).
    #[error("failed to connect to upstream: {0}")]
    Connect(String),

    /// Upstream did not produce a response head in time.
    #[error("upstream timed out after {0:?}")]
    Timeout(Duration),

    /// Connection broke or the upstream spoke malformed HTTP.
    #[error("upstream request failed: {0}")]
    Upstream(String),

    /// Outbound request could not be assembled.
    #[error("failed to build upstream request: {0}")]
    Request(#[from] axum::http::Error),
}

impl ProxyError {
    pub(crate) fn from_client(err: hyper_util::client::legacy::Error) -> Self {
        let detail = error_chain(&err);
        if err.is_connect() {
            ProxyError::Connect(detail)
        } else {
            ProxyError::Upstream(detail)
        }
    }

    /// Status code reported to the original client.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Connect(_) | ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ProxyError::InvalidTarget(_) | ProxyError::Request(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::InvalidTarget(_) => "invalid_target",
            ProxyError::Connect(_) => "connect",
            ProxyError::Timeout(_) => "timeout",
            ProxyError::Upstream(_) => "upstream",
            ProxyError::Request(_) => "request",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let message = match self.status() {
            StatusCode::GATEWAY_TIMEOUT => "Upstream timed out",
            StatusCode::BAD_GATEWAY => "Upstream request failed",
            _ => "Proxy misconfigured",
        };
        (self.status(), message).into_response()
    }
}

/// hyper-util's top-level error only says "client error (Connect)"; the
/// useful part is in the source chain.
fn error_chain(err: &dyn StdError) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
