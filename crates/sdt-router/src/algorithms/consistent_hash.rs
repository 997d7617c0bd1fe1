//! # Consistent Hash Strategy
//!
//! MD5 hash ring with 150 virtual nodes per physical node.
//!
//! Each strategy instance keeps one ring for databases and one for tables.
//! A ring is built lazily on first use and then reused for the life of the
//! instance, even if later calls carry a different node count. Call
//! [`RouterStrategy::reset`] after a topology change to rebuild.

use crate::domain::{invariant_index_in_range, DbId, RouterError, StrategyInput, StrategyKind, TableSuffix};
use crate::ports::RouterStrategy;
use md5::{Digest, Md5};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Virtual nodes placed on the ring per physical node.
pub const VIRTUAL_NODES_PER_NODE: u32 = 150;

/// Ring position of a key: first 8 MD5 bytes, big-endian, absolute value.
pub fn ring_hash(key: &str) -> u64 {
    let digest = Md5::digest(key.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    i64::from_be_bytes(head).unsigned_abs()
}

/// Sorted ring of virtual-node positions mapped to 1-based node indices.
#[derive(Clone, Debug)]
pub struct HashRing {
    node_count: u32,
    positions: BTreeMap<u64, u32>,
}

impl HashRing {
    /// Build the ring for `node_count` physical nodes.
    ///
    /// Virtual node `j` of node `i` sits at `ring_hash("{i}-VN{j}")`. On a
    /// position collision the later node wins.
    pub fn new(node_count: u32) -> Self {
        let mut positions = BTreeMap::new();
        for node in 1..=node_count {
            for replica in 0..VIRTUAL_NODES_PER_NODE {
                positions.insert(ring_hash(&format!("{}-VN{}", node, replica)), node);
            }
        }

        debug!(
            "[sdt] built hash ring: {} nodes, {} positions",
            node_count,
            positions.len()
        );

        Self {
            node_count,
            positions,
        }
    }

    /// Physical node count the ring was built for.
    pub fn node_count(&self) -> u32 {
        self.node_count
    }

    /// Number of occupied positions.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// True for a ring built with zero nodes.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Node owning `key`: the first position at or after the key's hash,
    /// wrapping to the lowest position. An empty ring answers node 1.
    pub fn locate(&self, key: &str) -> u32 {
        let hash = ring_hash(key);
        self.positions
            .range(hash..)
            .next()
            .or_else(|| self.positions.iter().next())
            .map(|(_, node)| *node)
            .unwrap_or(1)
    }
}

type RingCell = RwLock<Option<Arc<HashRing>>>;

/// Consistent-hash strategy with lazily built rings.
#[derive(Debug, Default)]
pub struct ConsistentHashStrategy {
    db_ring: RingCell,
    tb_ring: RingCell,
}

impl ConsistentHashStrategy {
    /// Create the strategy with no rings built.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build both rings up front.
    pub fn prewarm(&self, db_count: u32, tb_count: u32) {
        Self::ring_for(&self.db_ring, db_count, "db");
        Self::ring_for(&self.tb_ring, tb_count, "table");
    }

    /// Node count of the built database ring, if any.
    pub fn db_ring_nodes(&self) -> Option<u32> {
        self.db_ring.read().as_ref().map(|ring| ring.node_count())
    }

    /// Node count of the built table ring, if any.
    pub fn tb_ring_nodes(&self) -> Option<u32> {
        self.tb_ring.read().as_ref().map(|ring| ring.node_count())
    }

    fn ring_for(cell: &RingCell, node_count: u32, stage: &str) -> Arc<HashRing> {
        if let Some(ring) = cell.read().as_ref() {
            if ring.node_count() != node_count {
                debug!(
                    "[sdt] {} ring built for {} nodes, requested {}; keeping existing ring",
                    stage,
                    ring.node_count(),
                    node_count
                );
            }
            return Arc::clone(ring);
        }

        // Another caller may have built the ring between the two locks.
        let mut guard = cell.write();
        Arc::clone(guard.get_or_insert_with(|| Arc::new(HashRing::new(node_count))))
    }
}

impl RouterStrategy for ConsistentHashStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ConsistentHash
    }

    fn split_db(&self, input: &StrategyInput<'_>) -> Result<DbId, RouterError> {
        input.validate()?;
        let ring = Self::ring_for(&self.db_ring, input.db_count, "db");
        let index = ring.locate(input.key_value);
        invariant_index_in_range(index, ring.node_count(), "db")?;

        debug!(
            "[sdt] consistent-hash split_db key={} hash={} -> {}",
            input.key_value,
            ring_hash(input.key_value),
            index
        );
        Ok(DbId::new(index))
    }

    fn split_tb(&self, input: &StrategyInput<'_>) -> Result<TableSuffix, RouterError> {
        input.validate()?;
        let ring = Self::ring_for(&self.tb_ring, input.tb_count, "table");
        let index = ring.locate(input.key_value);
        invariant_index_in_range(index, ring.node_count(), "table")?;

        debug!(
            "[sdt] consistent-hash split_tb key={} hash={} -> {}",
            input.key_value,
            ring_hash(input.key_value),
            index
        );
        Ok(TableSuffix::new(index))
    }

    fn reset(&self) {
        *self.db_ring.write() = None;
        *self.tb_ring.write() = None;
        debug!("[sdt] consistent-hash rings cleared");
    }
}
