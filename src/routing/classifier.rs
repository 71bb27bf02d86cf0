//! Local-versus-upstream path classification.
//!
//! The classifier is built once from config and shared read-only; it is a
//! pure function of its rule and the path.

use std::fmt;
use std::sync::Arc;

use crate::config::RoutingConfig;
use crate::routing::matcher::{AnyRule, PathRule};

/// Where a request is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Served by the next handler in the local chain.
    Local,
    /// Forwarded to the upstream origin.
    Proxied,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Local => "local",
            Verdict::Proxied => "proxied",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides whether a path stays local or goes upstream.
#[derive(Debug, Clone)]
pub struct PathClassifier {
    rule: Arc<dyn PathRule>,
}

impl PathClassifier {
    /// Paths matching `rule` are local, everything else is proxied.
    pub fn new(rule: Arc<dyn PathRule>) -> Self {
        Self { rule }
    }

    pub fn from_config(config: &RoutingConfig) -> Self {
        Self::new(Arc::new(AnyRule::prefixes(config.local_prefixes.iter().cloned())))
    }

    pub fn classify(&self, path: &str) -> Verdict {
        let path = if path.is_empty() { "/" } else { path };
        if self.rule.matches(path) {
            Verdict::Local
        } else {
            Verdict::Proxied
        }
    }
}
