//! # Sharding Orchestrator
//!
//! Resolves an operation's [`ShardIntent`] into a [`RoutingDecision`] and
//! installs it in the routing context.
//!
//! Every failure here aborts the operation: an unknown group, a missing
//! strategy, or a route key with no value in the arguments. The decision is
//! computed in full before anything is written to the context, so a failed
//! `begin_operation` leaves the context untouched.

use super::routing_context;
use crate::algorithms::StrategyRegistry;
use crate::domain::{
    invariant_fits_group, invariant_routed_before_lookup, invariant_split_consistency,
    RouterConfig, RouterError, RoutingDecision, ShardIntent, StrategyInput, UNSPLIT_DB,
};
use crate::ports::RouteKeySource;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// First non-empty value of `route_key` across `args`.
pub fn find_route_value(route_key: &str, args: &[&dyn RouteKeySource]) -> Result<String, RouterError> {
    args.iter()
        .filter_map(|arg| arg.route_value(route_key))
        .find(|value| !value.is_empty())
        .ok_or_else(|| RouterError::RoutingValue {
            route_key: route_key.to_string(),
        })
}

/// Database-stage router.
#[derive(Clone, Debug)]
pub struct ShardingOrchestrator {
    config: Arc<RouterConfig>,
    strategies: Arc<StrategyRegistry>,
}

impl ShardingOrchestrator {
    /// Create an orchestrator over shared configuration and strategies.
    pub fn new(config: Arc<RouterConfig>, strategies: Arc<StrategyRegistry>) -> Self {
        Self { config, strategies }
    }

    /// Compute the decision for `intent` without touching the context.
    pub fn resolve(
        &self,
        intent: &ShardIntent,
        args: &[&dyn RouteKeySource],
    ) -> Result<RoutingDecision, RouterError> {
        let group = intent.group_id()?;
        let group_config = self.config.group(group)?;

        let mut decision = RoutingDecision {
            group: Some(group),
            strategy: Some(intent.strategy),
            ..RoutingDecision::default()
        };

        if group_config.enable_split {
            let strategy = self.strategies.get(intent.strategy)?;
            let route_key = intent.effective_route_key(&group_config.router_key);
            let value = find_route_value(route_key, args)?;

            let db = strategy.split_db(&StrategyInput::for_db(&value, group_config.db_count))?;
            invariant_fits_group(db.index(), group_config.db_count, "db")?;

            decision.db = Some(db);
            decision.route_value = Some(value);
        } else {
            decision.db = Some(UNSPLIT_DB);
        }

        invariant_routed_before_lookup(&decision)?;
        invariant_split_consistency(&decision, group_config)?;
        Ok(decision)
    }

    /// Resolve `intent` and install the decision in the active context.
    ///
    /// Must run inside [`routing_context::scope`] or
    /// [`routing_context::sync_scope`].
    pub fn begin_operation(
        &self,
        intent: &ShardIntent,
        args: &[&dyn RouteKeySource],
    ) -> Result<RoutingDecision, RouterError> {
        if !routing_context::is_active() {
            return Err(RouterError::NoActiveContext);
        }
        // A scope reused after `end_operation` has no id until the next begin.
        let operation_id = routing_context::operation_id().unwrap_or_else(Uuid::new_v4);

        let mut decision = match self.resolve(intent, args) {
            Ok(decision) => decision,
            Err(err) => {
                warn!(
                    operation_id = %operation_id,
                    group = intent.group,
                    reason = err.reason(),
                    "[sdt] routing aborted: {}", err
                );
                sdt_telemetry::record_route_failure(err.reason());
                return Err(err);
            }
        };
        decision.operation_id = Some(operation_id);
        routing_context::replace(decision.clone())?;

        let strategy = intent.strategy.label();
        sdt_telemetry::record_route(strategy);
        debug!(
            operation_id = %operation_id,
            connection = decision.connection_key().as_deref().unwrap_or_default(),
            strategy,
            split = decision.route_value.is_some(),
            "[sdt] operation routed"
        );
        Ok(decision)
    }

    /// Clear the active context.
    pub fn end_operation(&self) {
        routing_context::clear_all();
    }

    /// Shared configuration.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }
}
