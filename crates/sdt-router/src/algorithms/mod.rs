//! # Algorithms Module
//!
//! Partitioning strategies and the SQL table rewriter.

pub mod consistent_hash;
pub mod hash;
pub mod registry;
pub mod sql_rewrite;
pub mod time_based;

pub use consistent_hash::{ring_hash, ConsistentHashStrategy, HashRing, VIRTUAL_NODES_PER_NODE};
pub use hash::{spread, spread_hash, string_hash, HashStrategy};
pub use registry::StrategyRegistry;
pub use sql_rewrite::{RewriteOutcome, RewritePath, SqlTableRewriter, TableShardCounts};
pub use time_based::{parse_time_key, TimeBasedStrategy, TimeParsePolicy};
