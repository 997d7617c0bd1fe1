//! # Domain Errors
//!
//! Error types for the sharding router.
//!
//! Orchestration-stage errors (configuration, routing value) abort the
//! operation. Rewrite-stage errors are logged by the interceptor and the
//! statement runs unmodified.

use super::value_objects::{GroupId, StrategyKind};
use thiserror::Error;

/// Routing error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// Generic configuration problem.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The operation names a group that is not configured.
    #[error("Unknown shard group: {0}")]
    UnknownGroup(GroupId),

    /// No strategy instance is registered for the requested kind.
    #[error("No routing strategy registered for {0:?}")]
    MissingStrategy(StrategyKind),

    /// The route key has no usable value in the operation arguments.
    #[error("Route key '{route_key}' has no value in the operation arguments")]
    RoutingValue {
        /// Field name that was searched for
        route_key: String,
    },

    /// Strategy input out of range (zero shard counts, overflow).
    #[error("Invalid strategy input: {0}")]
    InvalidStrategyInput(String),

    /// Time-based key could not be parsed under the strict policy.
    #[error("Unparseable time key: {0}")]
    UnparseableTimeKey(String),

    /// A routing-context accessor ran outside an operation scope.
    #[error("No routing context is active for this task")]
    NoActiveContext,

    /// The routing decision is missing a field required by this stage.
    #[error("Incomplete routing decision: {0}")]
    IncompleteDecision(String),

    /// Malformed group/db/suffix identifier.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Configuration source could not be read or decoded.
    #[error("Failed to load configuration: {0}")]
    ConfigLoad(String),
}

impl RouterError {
    /// True for errors in the configuration class (unknown group, missing
    /// strategy, invalid config).
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_)
                | Self::UnknownGroup(_)
                | Self::MissingStrategy(_)
                | Self::ConfigLoad(_)
        )
    }

    /// True when the route key value could not be determined.
    pub fn is_routing_value(&self) -> bool {
        matches!(self, Self::RoutingValue { .. } | Self::UnparseableTimeKey(_))
    }

    /// Short label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::UnknownGroup(_) => "unknown_group",
            Self::MissingStrategy(_) => "missing_strategy",
            Self::RoutingValue { .. } => "routing_value",
            Self::InvalidStrategyInput(_) => "invalid_input",
            Self::UnparseableTimeKey(_) => "unparseable_time",
            Self::NoActiveContext => "no_context",
            Self::IncompleteDecision(_) => "incomplete_decision",
            Self::InvalidIdentifier(_) => "invalid_identifier",
            Self::ConfigLoad(_) => "config_load",
        }
    }
}

/// SQL rewrite errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RewriteError {
    /// Structural parse failed; the textual fallback takes over.
    #[error("SQL parse failed: {0}")]
    Parse(String),

    /// The fallback pattern could not be compiled.
    #[error("Fallback pattern error: {0}")]
    Pattern(String),
}
