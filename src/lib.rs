//! Geo gateway library: a local geocoding API in front of a fallback origin.
//!
//! Requests under the local prefixes (default `/api`) are served in-process;
//! everything else is streamed to and from the configured upstream.

pub mod config;
pub mod geo;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod routing;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
