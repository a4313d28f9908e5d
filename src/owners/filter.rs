// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Runtime-reconfigurable owner-ID allowlist used as a filter predicate.

use super::filtered::Accepted;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Pattern {
    Exact(String),
    Prefix(String),
}

impl Pattern {
    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        Some(match raw.strip_suffix('*') {
            Some(prefix) => Pattern::Prefix(prefix.to_string()),
            None => Pattern::Exact(raw.to_string()),
        })
    }

    fn matches(&self, id: &str) -> bool {
        match self {
            Pattern::Exact(exact) => id == exact,
            Pattern::Prefix(prefix) => id.starts_with(prefix.as_str()),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Exact(exact) => f.write_str(exact),
            Pattern::Prefix(prefix) => write!(f, "{prefix}*"),
        }
    }
}

/// Allowlist of owner-ID patterns.
///
/// A pattern is either an exact owner ID or a prefix followed by `*`; a lone
/// `*` accepts everything. Blank patterns are ignored, and an empty list
/// accepts nothing.
///
/// The patterns can be swapped at runtime with
/// [`set_patterns`](Self::set_patterns). Layers built from
/// [`predicate`](Self::predicate) see the new patterns immediately, but
/// their caches only catch up once
/// [`FilteredLayer::filter_changed`](super::FilteredLayer::filter_changed) runs.
/// Both calls are library API for embedders. The `dnsowner` binary builds the
/// filter once from `--owner-id-filter` and never replaces its patterns.
///
/// # Example
///
/// ```rust
/// use dnsowner::owners::OwnerIdFilter;
///
/// let filter = OwnerIdFilter::new(["team-a-*", "shared"]);
/// assert!(filter.accepts("team-a-prod"));
/// assert!(filter.accepts("shared"));
/// assert!(!filter.accepts("team-b-prod"));
/// ```
#[derive(Debug, Default)]
pub struct OwnerIdFilter {
    patterns: RwLock<Vec<Pattern>>,
}

impl OwnerIdFilter {
    pub fn new<I, S>(patterns: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let filter = Arc::new(Self::default());
        filter.set_patterns(patterns);
        filter
    }

    #[must_use]
    pub fn accepts(&self, id: &str) -> bool {
        self.patterns.read().iter().any(|pattern| pattern.matches(id))
    }

    /// Replace every pattern.
    pub fn set_patterns<I, S>(&self, patterns: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parsed: Vec<Pattern> = patterns
            .into_iter()
            .filter_map(|raw| Pattern::parse(raw.as_ref()))
            .collect();
        *self.patterns.write() = parsed;
    }

    /// Current patterns in their textual form.
    #[must_use]
    pub fn patterns(&self) -> Vec<String> {
        self.patterns.read().iter().map(ToString::to_string).collect()
    }

    /// Predicate reading this filter, for a [`FilteredLayer`](super::FilteredLayer).
    #[must_use]
    pub fn predicate(self: &Arc<Self>) -> Accepted {
        let filter = Arc::clone(self);
        Arc::new(move |id: &str| filter.accepts(id))
    }
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod filter_tests;
