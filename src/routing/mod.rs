//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → classifier.rs (empty path → "/")
//!     → matcher.rs (segment-aware prefix rules)
//!     → Verdict::Local | Verdict::Proxied
//!
//! Rule compilation (at startup):
//!     RoutingConfig.local_prefixes
//!     → one PathPrefixRule per prefix, OR-combined
//!     → frozen inside an immutable PathClassifier
//! ```
//!
//! # Design Decisions
//! - Rules compiled at startup, immutable at runtime
//! - Classification is total: every path gets a verdict
//! - Deterministic: same path always gets the same verdict

pub mod classifier;
pub mod matcher;

pub use classifier::{PathClassifier, Verdict};
pub use matcher::{AnyRule, PathPrefixRule, PathRule};
