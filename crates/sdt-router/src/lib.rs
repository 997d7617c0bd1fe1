//! # SDT Router
//!
//! Database and table sharding middleware for a host request pipeline.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Route every logical operation to one physical database and table
//! partition, derived from a business key:
//! - Pluggable strategies: spread hash, consistent-hash ring, time buckets
//! - Task-local routing context, cleared on every exit path
//! - SQL table renaming (`orders` -> `orders_002`) with a keyword fallback
//!
//! ## Operation lifecycle
//!
//! | Stage | Component | On failure |
//! |-------|-----------|------------|
//! | begin | [`ShardingOrchestrator`] | abort the operation |
//! | each statement | [`StatementInterceptor`] | run unmodified SQL |
//! | connection lookup | [`DatasourceResolver`] | default `group01db01` |
//! | end | routing context cleared | - |
//!
//! ## Module Structure
//!
//! ```text
//! sdt-router/
//! ├── domain/          # Identifiers, config, decision, errors, invariants
//! ├── algorithms/      # Strategies, registry, SQL rewriter
//! ├── ports/           # ShardingApi, RouterStrategy, RouteKeySource
//! ├── adapters/        # Routing context, orchestrator, interceptor, datasources
//! └── service.rs       # ShardingService facade
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! let service = ShardingService::from_env()?;
//! let args = HashMap::from([("userId".to_string(), "user123".to_string())]);
//!
//! let rows = service
//!     .run(&ShardIntent::group(1), &[&args], |decision| async move {
//!         let sql = service.on_before_execute("SELECT * FROM orders");
//!         pool(&service.resolve_connection_key()).query(&sql).await
//!     })
//!     .await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{
    find_route_value, routing_context, DatasourceRegistry, DatasourceResolver,
    ShardingOrchestrator, StatementInterceptor,
};
pub use algorithms::{
    ConsistentHashStrategy, HashRing, HashStrategy, RewriteOutcome, RewritePath,
    SqlTableRewriter, StrategyRegistry, TableShardCounts, TimeBasedStrategy, TimeParsePolicy,
};
pub use domain::{
    DataSourceDescriptor, DbId, GroupId, RewriteError, RouterConfig, RouterError,
    RoutingDecision, ShardGroupConfig, ShardIntent, StatementKind, StrategyInput, StrategyKind,
    TableSuffix, DEFAULT_CONNECTION_KEY,
};
pub use ports::{KeyFn, RouteKeySource, RouterStrategy, ShardingApi};
pub use service::ShardingService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
