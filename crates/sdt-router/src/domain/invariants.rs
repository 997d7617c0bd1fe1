//! # Domain Invariants
//!
//! Rules a routing decision must satisfy at every stage boundary.

use super::config::ShardGroupConfig;
use super::entities::RoutingDecision;
use super::errors::RouterError;
use super::value_objects::{DbId, StrategyInput};

/// Database used when a group has splitting disabled.
pub const UNSPLIT_DB: DbId = DbId::new(1);

/// Invariant: routing is a pure function of its input.
///
/// Same key + same counts = same shard.
pub fn invariant_deterministic_routing<F, T>(route_fn: F, input: &StrategyInput<'_>) -> bool
where
    F: Fn(&StrategyInput<'_>) -> Result<T, RouterError>,
    T: PartialEq,
{
    match (route_fn(input), route_fn(input)) {
        (Ok(first), Ok(second)) => first == second,
        (Err(first), Err(second)) => first == second,
        _ => false,
    }
}

/// Invariant: a strategy result fits the caller's shard count.
///
/// A result above `count` comes from strategy state sized for another
/// count (a consistent-hash ring built before the count changed) and is a
/// configuration error until the strategy is reset.
pub fn invariant_fits_group(index: u32, count: u32, what: &str) -> Result<(), RouterError> {
    if index > count {
        return Err(RouterError::Configuration(format!(
            "{} index {} exceeds the group's {} shards; reset the strategy after changing shard counts",
            what, index, count
        )));
    }
    invariant_index_in_range(index, count, what)
}

/// Invariant: a strategy result is a 1-based index within `count`.
pub fn invariant_index_in_range(index: u32, count: u32, what: &str) -> Result<(), RouterError> {
    if index == 0 || index > count {
        return Err(RouterError::InvalidStrategyInput(format!(
            "{} index {} outside 1..={}",
            what, index, count
        )));
    }
    Ok(())
}

/// Invariant: group and database are populated before any datasource lookup.
pub fn invariant_routed_before_lookup(decision: &RoutingDecision) -> Result<(), RouterError> {
    if !decision.is_routed() {
        return Err(RouterError::IncompleteDecision(
            "group and db must be set before datasource lookup".to_string(),
        ));
    }
    Ok(())
}

/// Invariant: table routing state exists iff the group splits.
///
/// Disabled groups always land on `db01` with no route value and no suffix.
pub fn invariant_split_consistency(
    decision: &RoutingDecision,
    group: &ShardGroupConfig,
) -> Result<(), RouterError> {
    if group.enable_split {
        if decision.route_value.is_none() {
            return Err(RouterError::IncompleteDecision(
                "split-enabled group has no route value".to_string(),
            ));
        }
        return Ok(());
    }

    if decision.table_suffix.is_some() || decision.route_value.is_some() {
        return Err(RouterError::IncompleteDecision(
            "split-disabled group carries table routing state".to_string(),
        ));
    }
    if decision.db != Some(UNSPLIT_DB) {
        return Err(RouterError::IncompleteDecision(format!(
            "split-disabled group must route to {}",
            UNSPLIT_DB
        )));
    }
    Ok(())
}
