//! # Domain Entities
//!
//! The per-operation routing decision.

use super::errors::RouterError;
use super::value_objects::{DbId, GroupId, StrategyKind, TableSuffix};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default connection key used when no decision is active.
pub const DEFAULT_CONNECTION_KEY: &str = "group01db01";

/// Resolved routing for one in-flight logical operation.
///
/// Group, strategy and database are set by the orchestrator; the table
/// suffix is set by the statement interceptor. `route_value` is kept apart
/// from the suffix so every statement recomputes the suffix from the
/// business key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Correlation id of the operation.
    pub operation_id: Option<Uuid>,
    /// Shard group.
    pub group: Option<GroupId>,
    /// Physical database.
    pub db: Option<DbId>,
    /// Physical table partition suffix; `None` when splitting is disabled.
    pub table_suffix: Option<TableSuffix>,
    /// Strategy selected by the operation.
    pub strategy: Option<StrategyKind>,
    /// Business key value; `None` when splitting is disabled.
    pub route_value: Option<String>,
}

impl RoutingDecision {
    /// Empty decision tagged with a fresh operation id.
    pub fn begin() -> Self {
        Self {
            operation_id: Some(Uuid::new_v4()),
            ..Self::default()
        }
    }

    /// True once both group and database are known.
    pub fn is_routed(&self) -> bool {
        self.group.is_some() && self.db.is_some()
    }

    /// `"{group}{db}"` when fully routed.
    pub fn connection_key(&self) -> Option<String> {
        match (self.group, self.db) {
            (Some(group), Some(db)) => Some(group.connection_key(db)),
            _ => None,
        }
    }

    /// The group, or an `IncompleteDecision` error.
    pub fn require_group(&self) -> Result<GroupId, RouterError> {
        self.group
            .ok_or_else(|| RouterError::IncompleteDecision("group is not set".to_string()))
    }

    /// Reset every field.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
