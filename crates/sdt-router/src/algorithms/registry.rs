//! # Strategy Registry
//!
//! One long-lived strategy instance per [`StrategyKind`].

use super::consistent_hash::ConsistentHashStrategy;
use super::hash::HashStrategy;
use super::time_based::{TimeBasedStrategy, TimeParsePolicy};
use crate::domain::{RouterError, StrategyKind};
use crate::ports::RouterStrategy;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Strategy lookup table.
///
/// Populated once at startup and shared read-only afterwards.
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    strategies: HashMap<StrategyKind, Arc<dyn RouterStrategy>>,
}

impl StrategyRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the consistent-hash, hash and time-based strategies.
    pub fn with_builtin() -> Self {
        Self::with_time_policy(TimeParsePolicy::default())
    }

    /// Built-in strategies, with an explicit time-key parse policy.
    pub fn with_time_policy(policy: TimeParsePolicy) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ConsistentHashStrategy::new()));
        registry.register(Arc::new(HashStrategy::new()));
        registry.register(Arc::new(TimeBasedStrategy::with_policy(policy)));
        registry
    }

    /// Register `strategy` under its own kind, returning any replaced one.
    pub fn register(&mut self, strategy: Arc<dyn RouterStrategy>) -> Option<Arc<dyn RouterStrategy>> {
        let kind = strategy.kind();
        info!("[sdt] registered {} strategy", kind.label());
        self.strategies.insert(kind, strategy)
    }

    /// The strategy for `kind`.
    pub fn get(&self, kind: StrategyKind) -> Result<Arc<dyn RouterStrategy>, RouterError> {
        self.strategies
            .get(&kind)
            .cloned()
            .ok_or(RouterError::MissingStrategy(kind))
    }

    /// True if a strategy is registered for `kind`.
    pub fn contains(&self, kind: StrategyKind) -> bool {
        self.strategies.contains_key(&kind)
    }

    /// Registered kinds in code order.
    pub fn kinds(&self) -> Vec<StrategyKind> {
        StrategyKind::ALL
            .into_iter()
            .filter(|kind| self.contains(*kind))
            .collect()
    }

    /// Drop cached state in every registered strategy.
    pub fn reset_all(&self) {
        for strategy in self.strategies.values() {
            strategy.reset();
        }
    }
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
