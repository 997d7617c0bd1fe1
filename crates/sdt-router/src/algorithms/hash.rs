//! # Hash Strategy
//!
//! Modulo routing over a spread 32-bit string hash.
//!
//! The string hash is the classic polynomial `h = 31*h + c` over UTF-16
//! code units with wrapping 32-bit arithmetic, so shard assignments match
//! data written by existing deployments.

use crate::domain::{invariant_index_in_range, DbId, RouterError, StrategyInput, StrategyKind, TableSuffix};
use crate::ports::RouterStrategy;
use tracing::debug;

/// Polynomial 32-bit string hash over UTF-16 code units.
pub fn string_hash(key: &str) -> i32 {
    key.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

/// `h ^ (h >>> 16)`: folds the high bits into the low bits.
pub fn spread(hash: i32) -> i32 {
    hash ^ ((hash as u32) >> 16) as i32
}

/// Spread hash of a routing key.
pub fn spread_hash(key: &str) -> i32 {
    spread(string_hash(key))
}

/// Hash-modulo strategy. Stateless.
#[derive(Clone, Copy, Debug, Default)]
pub struct HashStrategy;

impl HashStrategy {
    /// Create the strategy.
    pub fn new() -> Self {
        Self
    }

    /// 1-based database index: `|h| mod db_count + 1`.
    pub fn db_index(key: &str, db_count: u32) -> u32 {
        spread_hash(key).unsigned_abs() % db_count + 1
    }

    /// 1-based table index: `|h / db_count| mod tb_count + 1`.
    ///
    /// Dividing by the configured database count keeps table choice
    /// independent from the database choice.
    pub fn tb_index(key: &str, db_count: u32, tb_count: u32) -> u32 {
        let hash = i64::from(spread_hash(key));
        let quotient = hash / i64::from(db_count);
        (quotient.unsigned_abs() % u64::from(tb_count)) as u32 + 1
    }
}

impl RouterStrategy for HashStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Hash
    }

    fn split_db(&self, input: &StrategyInput<'_>) -> Result<DbId, RouterError> {
        input.validate()?;
        let index = Self::db_index(input.key_value, input.db_count);
        invariant_index_in_range(index, input.db_count, "db")?;
        let db = DbId::new(index);

        debug!(
            "[sdt] hash split_db key={} db_count={} -> {}",
            input.key_value, input.db_count, db
        );
        Ok(db)
    }

    fn split_tb(&self, input: &StrategyInput<'_>) -> Result<TableSuffix, RouterError> {
        input.validate()?;
        let index = Self::tb_index(input.key_value, input.db_count, input.tb_count);
        invariant_index_in_range(index, input.tb_count, "table")?;
        let suffix = TableSuffix::new(index);

        debug!(
            "[sdt] hash split_tb key={} db_count={} tb_count={} -> {}",
            input.key_value, input.db_count, input.tb_count, suffix
        );
        Ok(suffix)
    }
}
