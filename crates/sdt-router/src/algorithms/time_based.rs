//! # Time-Based Strategy
//!
//! Calendar bucketing of a timestamp key in the host's local timezone.
//!
//! - database: `(year * 100 + month) mod db_count + 1`
//! - table: `(year * 10000 + month * 100 + day) mod tb_count + 1`
//!
//! Accepted keys: epoch seconds (values below `10^10`), epoch milliseconds,
//! or a `YYYY-MM-DD` date taken as local midnight.

use crate::domain::{invariant_index_in_range, DbId, RouterError, StrategyInput, StrategyKind, TableSuffix};
use crate::ports::RouterStrategy;
use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Numeric keys below this are epoch seconds, at or above are milliseconds.
pub const SECONDS_THRESHOLD: i64 = 10_000_000_000;

/// What to do with a key that is neither a number nor a date.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeParsePolicy {
    /// Route by the current time and log a warning.
    #[default]
    FallbackToNow,
    /// Fail with [`RouterError::UnparseableTimeKey`].
    Strict,
}

/// Time-bucket strategy.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimeBasedStrategy {
    policy: TimeParsePolicy,
}

impl TimeBasedStrategy {
    /// Strategy with the fallback-to-now policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Strategy with an explicit parse policy.
    pub fn with_policy(policy: TimeParsePolicy) -> Self {
        Self { policy }
    }

    /// Configured parse policy.
    pub fn policy(&self) -> TimeParsePolicy {
        self.policy
    }

    /// Resolve a key to a local datetime under the configured policy.
    pub fn resolve(&self, key: &str) -> Result<DateTime<Local>, RouterError> {
        if let Some(at) = parse_time_key(key) {
            return Ok(at);
        }
        match self.policy {
            TimeParsePolicy::Strict => Err(RouterError::UnparseableTimeKey(key.to_string())),
            TimeParsePolicy::FallbackToNow => {
                warn!("[sdt] unparseable time key '{}', routing by current time", key);
                Ok(Local::now())
            }
        }
    }
}

/// Parse an epoch-seconds, epoch-milliseconds or `YYYY-MM-DD` key.
///
/// No surrounding whitespace is accepted and month and day need two digits.
pub fn parse_time_key(key: &str) -> Option<DateTime<Local>> {
    if let Ok(raw) = key.parse::<i64>() {
        let millis = if raw < SECONDS_THRESHOLD {
            raw.checked_mul(1000)?
        } else {
            raw
        };
        return Local.timestamp_millis_opt(millis).single();
    }

    if !is_date_shaped(key) {
        return None;
    }
    let date = NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()?;
    Local
        .from_local_datetime(&date.and_hms_opt(0, 0, 0)?)
        .earliest()
}

fn is_date_shaped(key: &str) -> bool {
    let bytes = key.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

fn bucket(value: i64, count: u32) -> u32 {
    value.rem_euclid(i64::from(count)) as u32 + 1
}

impl RouterStrategy for TimeBasedStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::TimeBased
    }

    fn split_db(&self, input: &StrategyInput<'_>) -> Result<DbId, RouterError> {
        input.validate()?;
        let at = self.resolve(input.key_value)?;
        let year_month = i64::from(at.year()) * 100 + i64::from(at.month());
        let index = bucket(year_month, input.db_count);
        invariant_index_in_range(index, input.db_count, "db")?;

        debug!(
            "[sdt] time split_db key={} year_month={} -> {}",
            input.key_value, year_month, index
        );
        Ok(DbId::new(index))
    }

    fn split_tb(&self, input: &StrategyInput<'_>) -> Result<TableSuffix, RouterError> {
        input.validate()?;
        let at = self.resolve(input.key_value)?;
        let date_num =
            i64::from(at.year()) * 10_000 + i64::from(at.month()) * 100 + i64::from(at.day());
        let index = bucket(date_num, input.tb_count);
        invariant_index_in_range(index, input.tb_count, "table")?;

        debug!(
            "[sdt] time split_tb key={} date={} -> {}",
            input.key_value, date_num, index
        );
        Ok(TableSuffix::new(index))
    }
}
