//! # Domain Value Objects
//!
//! Immutable value types for routing: shard identifiers, strategy kinds,
//! strategy inputs and the declarative sharding intent of an operation.

use super::errors::RouterError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Defines a 1-based, zero-padded shard index with a textual prefix.
macro_rules! shard_index {
    ($(#[$meta:meta])* $name:ident, $prefix:literal, $width:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(u32);

        impl $name {
            /// Wrap a 1-based index.
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            /// Wrap a 1-based index, rejecting zero.
            pub fn try_new(index: u32) -> Result<Self, RouterError> {
                if index == 0 {
                    return Err(RouterError::InvalidIdentifier(format!(
                        "{} index must be 1-based, got 0",
                        stringify!($name)
                    )));
                }
                Ok(Self(index))
            }

            /// The 1-based index.
            pub const fn index(&self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{:0", $width, "}"), self.0)
            }
        }

        impl FromStr for $name {
            type Err = RouterError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let digits = s.strip_prefix($prefix).ok_or_else(|| {
                    RouterError::InvalidIdentifier(format!(
                        "'{}' does not start with '{}'",
                        s, $prefix
                    ))
                })?;
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(RouterError::InvalidIdentifier(format!(
                        "'{}' is not of the form {}NN",
                        s, $prefix
                    )));
                }
                let index = digits
                    .parse::<u32>()
                    .map_err(|e| RouterError::InvalidIdentifier(format!("'{}': {}", s, e)))?;
                Self::try_new(index)
            }
        }

        impl TryFrom<String> for $name {
            type Error = RouterError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.to_string()
            }
        }
    };
}

shard_index!(
    /// Shard group identifier, rendered `group01`, `group02`, ...
    GroupId,
    "group",
    2
);

shard_index!(
    /// Physical database identifier within a group, rendered `db01`, `db02`, ...
    DbId,
    "db",
    2
);

shard_index!(
    /// Physical table partition suffix, rendered `001`, `002`, ...
    TableSuffix,
    "",
    3
);

impl GroupId {
    /// Connection-pool key for a database in this group (`group01db02`).
    pub fn connection_key(&self, db: DbId) -> String {
        format!("{}{}", self, db)
    }
}

/// Partitioning algorithm selector.
///
/// Codes are stable so intents can be declared numerically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyKind {
    /// Virtual-node hash ring.
    ConsistentHash,
    /// Spread string hash modulo shard count.
    #[default]
    Hash,
    /// Calendar buckets of a timestamp key.
    TimeBased,
    /// User-registered strategy slot 1.
    Custom1,
    /// User-registered strategy slot 2.
    Custom2,
    /// User-registered strategy slot 3.
    Custom3,
    /// User-registered strategy slot 4.
    Custom4,
}

impl StrategyKind {
    /// All kinds, in code order.
    pub const ALL: [StrategyKind; 7] = [
        Self::ConsistentHash,
        Self::Hash,
        Self::TimeBased,
        Self::Custom1,
        Self::Custom2,
        Self::Custom3,
        Self::Custom4,
    ];

    /// Numeric code of this kind.
    pub fn code(&self) -> u8 {
        match self {
            Self::ConsistentHash => 1,
            Self::Hash => 2,
            Self::TimeBased => 3,
            Self::Custom1 => 4,
            Self::Custom2 => 5,
            Self::Custom3 => 6,
            Self::Custom4 => 7,
        }
    }

    /// Look up a kind by numeric code.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    /// Lowercase label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ConsistentHash => "consistent_hash",
            Self::Hash => "hash",
            Self::TimeBased => "time_based",
            Self::Custom1 => "custom_1",
            Self::Custom2 => "custom_2",
            Self::Custom3 => "custom_3",
            Self::Custom4 => "custom_4",
        }
    }
}

/// Input to one strategy call. Borrowed, carries no ownership.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StrategyInput<'a> {
    /// Business key value.
    pub key_value: &'a str,
    /// Configured database count of the group.
    pub db_count: u32,
    /// Table partition count (maximum across the group's tables).
    pub tb_count: u32,
}

impl<'a> StrategyInput<'a> {
    /// Input for a database-stage call.
    pub fn for_db(key_value: &'a str, db_count: u32) -> Self {
        Self {
            key_value,
            db_count,
            tb_count: 1,
        }
    }

    /// Input for a table-stage call.
    pub fn for_table(key_value: &'a str, db_count: u32, tb_count: u32) -> Self {
        Self {
            key_value,
            db_count,
            tb_count,
        }
    }

    /// Reject zero counts before any modulo arithmetic.
    pub fn validate(&self) -> Result<(), RouterError> {
        if self.db_count == 0 {
            return Err(RouterError::InvalidStrategyInput(
                "db_count must be >= 1".to_string(),
            ));
        }
        if self.tb_count == 0 {
            return Err(RouterError::InvalidStrategyInput(
                "tb_count must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Static sharding intent declared by an operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardIntent {
    /// 1-based group number (`1` -> `group01`).
    pub group: u32,
    /// Override for the group's configured route key.
    pub route_key: Option<String>,
    /// Strategy used for both database and table stages.
    pub strategy: StrategyKind,
}

impl Default for ShardIntent {
    fn default() -> Self {
        Self {
            group: 1,
            route_key: None,
            strategy: StrategyKind::default(),
        }
    }
}

impl ShardIntent {
    /// Intent for the given group with the default strategy.
    pub fn group(group: u32) -> Self {
        Self {
            group,
            ..Self::default()
        }
    }

    /// Override the route key name.
    pub fn route_key(mut self, route_key: impl Into<String>) -> Self {
        self.route_key = Some(route_key.into());
        self
    }

    /// Select the strategy kind.
    pub fn strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    /// Resolve the group identifier.
    pub fn group_id(&self) -> Result<GroupId, RouterError> {
        GroupId::try_new(self.group)
    }

    /// Effective route key: the override when non-empty, else `default_key`.
    pub fn effective_route_key<'a>(&'a self, default_key: &'a str) -> &'a str {
        match self.route_key.as_deref() {
            Some(key) if !key.is_empty() => key,
            _ => default_key,
        }
    }
}

/// Coarse statement classification by leading keyword.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatementKind {
    /// `SELECT ...`
    Select,
    /// `INSERT ...`
    Insert,
    /// `UPDATE ...`
    Update,
    /// `DELETE ...`
    Delete,
    /// Anything else (including empty input).
    Unknown,
}

impl StatementKind {
    /// Classify SQL text by its first keyword, case-insensitively.
    pub fn classify(sql: &str) -> Self {
        let head: String = sql
            .trim_start()
            .chars()
            .take(6)
            .collect::<String>()
            .to_ascii_uppercase();
        match head.as_str() {
            "SELECT" => Self::Select,
            "INSERT" => Self::Insert,
            "UPDATE" => Self::Update,
            "DELETE" => Self::Delete,
            _ => Self::Unknown,
        }
    }
}
