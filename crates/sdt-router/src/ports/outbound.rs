//! # Outbound Ports
//!
//! The pluggable partitioning-strategy contract.

use crate::domain::{DbId, RouterError, StrategyInput, StrategyKind, TableSuffix};

/// Partitioning strategy - outbound port.
///
/// Implementations are long-lived and shared by every operation of their
/// kind. Each call must be a deterministic function of the input so that
/// previously written rows stay findable across restarts.
pub trait RouterStrategy: Send + Sync {
    /// Kind this strategy is registered under.
    fn kind(&self) -> StrategyKind;

    /// Choose the physical database for `(key_value, db_count)`.
    fn split_db(&self, input: &StrategyInput<'_>) -> Result<DbId, RouterError>;

    /// Choose the table partition for `(key_value, db_count, tb_count)`.
    fn split_tb(&self, input: &StrategyInput<'_>) -> Result<TableSuffix, RouterError>;

    /// Drop any cached instance state.
    fn reset(&self) {}
}

// =============================================================================
// Test double
// =============================================================================

/// Strategy returning fixed shards, or failing on demand.
///
/// Used to exercise custom-strategy registration and fail-open paths.
#[derive(Clone, Debug)]
pub struct FixedStrategy {
    /// Kind slot to register under.
    pub kind: StrategyKind,
    /// Database returned by `split_db`.
    pub db: DbId,
    /// Suffix returned by `split_tb`; `None` makes `split_tb` fail.
    pub suffix: Option<TableSuffix>,
}

impl FixedStrategy {
    /// Strategy always answering `db` / `suffix`.
    pub fn new(kind: StrategyKind, db: DbId, suffix: TableSuffix) -> Self {
        Self {
            kind,
            db,
            suffix: Some(suffix),
        }
    }

    /// Strategy whose table stage always fails.
    pub fn failing_tables(kind: StrategyKind, db: DbId) -> Self {
        Self {
            kind,
            db,
            suffix: None,
        }
    }
}

impl RouterStrategy for FixedStrategy {
    fn kind(&self) -> StrategyKind {
        self.kind
    }

    fn split_db(&self, input: &StrategyInput<'_>) -> Result<DbId, RouterError> {
        input.validate()?;
        Ok(self.db)
    }

    fn split_tb(&self, input: &StrategyInput<'_>) -> Result<TableSuffix, RouterError> {
        input.validate()?;
        self.suffix.ok_or_else(|| {
            RouterError::InvalidStrategyInput(format!(
                "{:?} cannot route tables for key '{}'",
                self.kind, input.key_value
            ))
        })
    }
}
