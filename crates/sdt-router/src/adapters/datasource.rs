//! # Datasource Resolver
//!
//! Maps the active routing context to a connection key, and connection keys
//! to configured datasource descriptors.

use super::routing_context;
use crate::domain::{DataSourceDescriptor, RouterConfig, RoutingDecision, DEFAULT_CONNECTION_KEY};
use std::collections::BTreeMap;
use tracing::debug;

/// Connection-key lookup for the active operation.
#[derive(Clone, Copy, Debug, Default)]
pub struct DatasourceResolver;

impl DatasourceResolver {
    /// Create the resolver.
    pub fn new() -> Self {
        Self
    }

    /// `"{group}{db}"` for the active context, or the default key when no
    /// context is active or it is not fully routed. Read-only.
    pub fn resolve_connection_key(&self) -> String {
        Self::key_for(routing_context::snapshot().as_ref())
    }

    /// Connection key for an explicit decision.
    pub fn key_for(decision: Option<&RoutingDecision>) -> String {
        match decision.and_then(RoutingDecision::connection_key) {
            Some(key) => {
                debug!("[sdt] connection key {}", key);
                key
            }
            None => DEFAULT_CONNECTION_KEY.to_string(),
        }
    }
}

/// Every configured datasource by connection key.
#[derive(Clone, Debug, Default)]
pub struct DatasourceRegistry {
    sources: BTreeMap<String, DataSourceDescriptor>,
}

impl DatasourceRegistry {
    /// Collect the descriptors of every group in `config`.
    pub fn from_config(config: &RouterConfig) -> Self {
        let sources = config
            .groups
            .iter()
            .flat_map(|(group, group_config)| {
                group_config
                    .datasources
                    .iter()
                    .map(move |(db, descriptor)| (group.connection_key(*db), descriptor.clone()))
            })
            .collect();
        Self { sources }
    }

    /// Descriptor registered under exactly `key`.
    pub fn get(&self, key: &str) -> Option<&DataSourceDescriptor> {
        self.sources.get(key)
    }

    /// Descriptor for `key`, falling back to the default connection.
    pub fn resolve(&self, key: &str) -> Option<&DataSourceDescriptor> {
        self.get(key).or_else(|| self.get(DEFAULT_CONNECTION_KEY))
    }

    /// Descriptor for the active routing context.
    pub fn resolve_current(&self) -> Option<&DataSourceDescriptor> {
        self.resolve(&DatasourceResolver::new().resolve_connection_key())
    }

    /// Registered connection keys, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    /// Number of registered datasources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
