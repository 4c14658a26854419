//! Context-key evaluation boundary.
//!
//! Slash command visibility is gated by `when` expressions evaluated
//! against ambient editor state. The full expression language lives in the
//! workbench; the registry only needs a yes/no answer, so the boundary is
//! a single-method trait. [`StaticContextKeys`] is a small set-backed
//! evaluator for hosts that manage flat boolean keys, and for tests.

use std::collections::HashSet;

use parking_lot::RwLock;

/// Evaluates a serialized context-key expression against current state.
///
/// Called on every slash-command read — implementations should be cheap
/// and must reflect the state at the moment of the call, not at
/// registration time.
pub trait ContextKeySource: Send + Sync {
    /// Whether `expression` holds right now.
    fn matches(&self, expression: &str) -> bool;
}

/// Evaluates every expression as true. For hosts without context keys.
#[derive(Debug, Default)]
pub struct AlwaysMatches;

impl ContextKeySource for AlwaysMatches {
    fn matches(&self, _expression: &str) -> bool {
        true
    }
}

/// A mutable set of boolean context keys.
///
/// An expression is a bare key name, optionally prefixed with `!` for
/// negation. Anything richer belongs to the workbench evaluator.
#[derive(Debug, Default)]
pub struct StaticContextKeys {
    keys: RwLock<HashSet<String>>,
}

impl StaticContextKeys {
    /// An empty key set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a key to true.
    pub fn set(&self, key: impl Into<String>) {
        self.keys.write().insert(key.into());
    }

    /// Clear a key back to false.
    pub fn clear(&self, key: &str) {
        self.keys.write().remove(key);
    }
}

impl ContextKeySource for StaticContextKeys {
    fn matches(&self, expression: &str) -> bool {
        let keys = self.keys.read();
        match expression.strip_prefix('!') {
            Some(key) => !keys.contains(key.trim()),
            None => keys.contains(expression.trim()),
        }
    }
}
