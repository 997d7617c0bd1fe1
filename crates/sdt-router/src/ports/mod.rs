//! # Ports Layer
//!
//! Inbound API and outbound strategy contract.

pub mod inbound;
pub mod outbound;

pub use inbound::{KeyFn, RouteKeySource, ShardingApi};
pub use outbound::{FixedStrategy, RouterStrategy};
