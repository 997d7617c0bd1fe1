//! # Adapters Layer
//!
//! Runtime pieces that connect the routing algorithms to a host pipeline:
//! the task-local routing context and the three interception points.

pub mod datasource;
pub mod interceptor;
pub mod orchestrator;
pub mod routing_context;

pub use datasource::{DatasourceRegistry, DatasourceResolver};
pub use interceptor::StatementInterceptor;
pub use orchestrator::{find_route_value, ShardingOrchestrator};
