//! The fallback origin.

use std::fmt;
use std::str::FromStr;

use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{HeaderValue, Uri};

use crate::config::UpstreamConfig;
use crate::proxy::error::ProxyError;

/// Immutable host/port of the upstream origin, validated at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    authority: Authority,
}

impl UpstreamTarget {
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self, ProxyError> {
        let host: String = host.into();
        let host = host.trim();
        if host.is_empty() || port == 0 {
            return Err(ProxyError::InvalidTarget(format!("{}:{}", host, port)));
        }

        // Bare IPv6 literals need brackets inside an authority.
        let raw = if host.contains(':') && !host.starts_with('[') {
            format!("[{}]:{}", host, port)
        } else {
            format!("{}:{}", host, port)
        };
        let authority = Authority::from_str(&raw).map_err(|_| ProxyError::InvalidTarget(raw))?;

        Ok(Self { authority })
    }

    pub fn from_config(config: &UpstreamConfig) -> Result<Self, ProxyError> {
        Self::new(config.host.clone(), config.port)
    }

    /// Value for the outbound `Host` header.
    pub fn host_header(&self) -> HeaderValue {
        // An Authority only holds visible ASCII, which is always a valid header value.
        HeaderValue::from_str(self.authority.as_str())
            .unwrap_or_else(|_| HeaderValue::from_static("localhost"))
    }

    /// Rebase `original` onto this target, keeping path and query verbatim.
    pub fn uri_for(&self, original: &Uri) -> Result<Uri, ProxyError> {
        let path_and_query = original
            .path_and_query()
            .cloned()
            .unwrap_or_else(|| PathAndQuery::from_static("/"));

        Ok(Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()?)
    }
}

impl fmt::Display for UpstreamTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.authority.as_str())
    }
}
