//! Upstream fallback subsystem.
//!
//! # Data Flow
//! ```text
//! Request
//!     → layer.rs (classify path via routing::PathClassifier)
//!     → Local:   next handler, response passed through untouched
//!     → Proxied: forwarder.rs
//!                  → upstream.rs (rebase URI onto host:port)
//!                  → headers.rs (strip hop-by-hop, add X-Forwarded-*)
//!                  → hyper client, single attempt, bounded by timeouts
//!                  → headers.rs (strip hop-by-hop from the response)
//!                  → streamed back to the client
//! ```
//!
//! # Design Decisions
//! - Upstream target and classifier are immutable after startup
//! - No retries: a failed hop becomes 502, a slow one 504
//! - Dropping the response future cancels the upstream request

pub mod error;
pub mod forwarder;
pub mod headers;
pub mod layer;
pub mod upstream;

pub use error::ProxyError;
pub use forwarder::{Forwarder, ForwarderSettings};
pub use layer::{FallbackLayer, FallbackService};
pub use upstream::UpstreamTarget;
