//! # Statement Interceptor
//!
//! Per-statement hook: computes the table partition for the active
//! operation and renames its partitioned tables.
//!
//! Fail-open. Any lookup or strategy failure is logged, counted and the
//! statement runs unmodified against the base tables.

use super::routing_context;
use crate::algorithms::{SqlTableRewriter, StrategyRegistry};
use crate::domain::{
    invariant_fits_group, RewriteError, RouterConfig, RouterError, RoutingDecision,
    StatementKind, StrategyInput, TableSuffix,
};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, warn};

/// Table-stage router.
#[derive(Clone, Debug)]
pub struct StatementInterceptor {
    config: Arc<RouterConfig>,
    strategies: Arc<StrategyRegistry>,
    rewriter: SqlTableRewriter,
}

impl StatementInterceptor {
    /// Create an interceptor over shared configuration and strategies.
    pub fn new(
        config: Arc<RouterConfig>,
        strategies: Arc<StrategyRegistry>,
    ) -> Result<Self, RewriteError> {
        Ok(Self {
            config,
            strategies,
            rewriter: SqlTableRewriter::new()?,
        })
    }

    /// Original or rewritten SQL for the active operation. Never fails.
    pub fn on_before_execute<'a>(&self, sql: &'a str) -> Cow<'a, str> {
        let Some(decision) = routing_context::snapshot() else {
            return Cow::Borrowed(sql);
        };
        let Some(route_value) = decision.route_value.as_deref() else {
            return Cow::Borrowed(sql);
        };

        match self.rewrite(sql, &decision, route_value) {
            Ok(Some(rewritten)) => Cow::Owned(rewritten),
            Ok(None) => Cow::Borrowed(sql),
            Err(err) => {
                warn!(
                    operation_id = ?decision.operation_id,
                    reason = err.reason(),
                    statement = ?StatementKind::classify(sql),
                    "[sdt] rewrite skipped, executing unmodified SQL: {}", err
                );
                sdt_telemetry::record_rewrite_skipped(err.reason());
                Cow::Borrowed(sql)
            }
        }
    }

    /// Table partition for `route_value` under the decision's group.
    pub fn table_suffix(
        &self,
        decision: &RoutingDecision,
        route_value: &str,
    ) -> Result<TableSuffix, RouterError> {
        let group_config = self.config.group(decision.require_group()?)?;
        let strategy = self.strategies.get(decision.strategy.unwrap_or_default())?;

        let tb_count = group_config.max_tb_count();
        let suffix = strategy.split_tb(&StrategyInput::for_table(
            route_value,
            group_config.db_count,
            tb_count,
        ))?;
        invariant_fits_group(suffix.index(), tb_count, "table")?;
        Ok(suffix)
    }

    fn rewrite(
        &self,
        sql: &str,
        decision: &RoutingDecision,
        route_value: &str,
    ) -> Result<Option<String>, RouterError> {
        let group = decision.require_group()?;
        let tables = &self.config.group(group)?.tb_counts;
        if tables.is_empty() {
            return Ok(None);
        }

        let suffix = self.table_suffix(decision, route_value)?;
        routing_context::set_table_suffix(Some(suffix))?;

        let outcome = self
            .rewriter
            .rewrite_detailed(sql, tables, &suffix.to_string());
        if !outcome.is_changed() || outcome.sql == sql {
            return Ok(None);
        }

        sdt_telemetry::record_rewrite(outcome.path.label());
        debug!(
            group = %group,
            suffix = %suffix,
            path = outcome.path.label(),
            tables = ?outcome.renamed,
            "[sdt] statement rewritten"
        );
        Ok(Some(outcome.sql))
    }
}
