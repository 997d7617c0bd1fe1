//! # Inbound Ports
//!
//! API trait exposed to the host pipeline, and the typed key sources that
//! replace runtime field introspection of operation arguments.

use crate::domain::{RouterConfig, RouterError, RoutingDecision, ShardIntent};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Sharding API - inbound port.
///
/// Call order within one operation: `begin_operation` ->
/// `on_before_execute` (zero or more times) / `resolve_connection_key` ->
/// `end_operation`. All calls must run inside a routing-context scope.
pub trait ShardingApi: Send + Sync {
    /// Resolve the intent and populate the active routing context.
    fn begin_operation(
        &self,
        intent: &ShardIntent,
        args: &[&dyn RouteKeySource],
    ) -> Result<RoutingDecision, RouterError>;

    /// Clear the active routing context.
    fn end_operation(&self);

    /// Statement execution hook: original or rewritten SQL. Never fails.
    fn on_before_execute<'a>(&self, sql: &'a str) -> Cow<'a, str>;

    /// Datasource selection hook: `"{group}{db}"` or the default key.
    fn resolve_connection_key(&self) -> String;

    /// Configuration the router was built with.
    fn config(&self) -> &RouterConfig;
}

/// An operation argument that may carry a named route-key field.
///
/// Plain scalars return `None` for every field, so they are skipped.
pub trait RouteKeySource: Sync {
    /// Text value of `field`, if present and non-null.
    fn route_value(&self, field: &str) -> Option<String>;
}

impl<S: BuildHasher + Sync> RouteKeySource for HashMap<String, String, S> {
    fn route_value(&self, field: &str) -> Option<String> {
        self.get(field).cloned()
    }
}

impl RouteKeySource for BTreeMap<String, String> {
    fn route_value(&self, field: &str) -> Option<String> {
        self.get(field).cloned()
    }
}

impl RouteKeySource for Value {
    fn route_value(&self, field: &str) -> Option<String> {
        match self.as_object()?.get(field)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

impl RouteKeySource for str {
    fn route_value(&self, _field: &str) -> Option<String> {
        None
    }
}

impl RouteKeySource for String {
    fn route_value(&self, _field: &str) -> Option<String> {
        None
    }
}

/// Closure-backed key extractor.
///
/// ```ignore
/// let order = Order { user_id: 42 };
/// let source = KeyFn(|field: &str| (field == "userId").then(|| order.user_id.to_string()));
/// ```
pub struct KeyFn<F>(pub F);

impl<F> RouteKeySource for KeyFn<F>
where
    F: Fn(&str) -> Option<String> + Sync,
{
    fn route_value(&self, field: &str) -> Option<String> {
        (self.0)(field)
    }
}
