//! Path matching rules.
//!
//! # Design Decisions
//! - Rules see only the path, never method, headers or body
//! - Prefixes match whole segments: `/api` matches `/api` and `/api/x`, not `/apicola`
//! - Path matching is case-sensitive
//! - No regex, so matching stays O(prefix length)

/// Predicate over a request path.
pub trait PathRule: Send + Sync + std::fmt::Debug {
    /// Returns true if the path matches this rule.
    fn matches(&self, path: &str) -> bool;
}

/// Matches a path prefix on segment boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixRule {
    /// Stored without a trailing slash; empty means "every path".
    prefix: String,
}

impl PathPrefixRule {
    /// Create a new segment-aware prefix rule.
    ///
    /// Trailing slashes are ignored, so `/api/` and `/api` behave the same.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        if self.prefix.is_empty() {
            "/"
        } else {
            &self.prefix
        }
    }
}

impl PathRule for PathPrefixRule {
    fn matches(&self, path: &str) -> bool {
        if self.prefix.is_empty() {
            return true;
        }
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

/// Combines multiple rules with OR semantics.
#[derive(Debug)]
pub struct AnyRule {
    rules: Vec<Box<dyn PathRule>>,
}

impl AnyRule {
    pub fn new(rules: Vec<Box<dyn PathRule>>) -> Self {
        Self { rules }
    }

    /// One segment-aware prefix rule per entry.
    pub fn prefixes<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            prefixes
                .into_iter()
                .map(|p| Box::new(PathPrefixRule::new(p)) as Box<dyn PathRule>)
                .collect(),
        )
    }
}

impl PathRule for AnyRule {
    fn matches(&self, path: &str) -> bool {
        self.rules.iter().any(|r| r.matches(path))
    }
}
