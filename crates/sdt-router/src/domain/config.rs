//! Router configuration and validation
//!
//! Pre-parsed shard-group configuration. Immutable once loaded; the router
//! only reads it.
//!
//! # Example
//!
//! ```ignore
//! use sdt_router::domain::RouterConfig;
//!
//! let config = RouterConfig::from_json_str(r#"{
//!     "groups": {
//!         "group01": {
//!             "enableSplit": true,
//!             "dbCount": 2,
//!             "tbCounts": { "orders": 4 },
//!             "routerKey": "userId"
//!         }
//!     }
//! }"#)?;
//! ```

use super::errors::RouterError;
use super::value_objects::{DbId, GroupId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Environment variable naming the JSON configuration file.
pub const CONFIG_PATH_ENV: &str = "SDT_ROUTER_CONFIG";

/// Connection descriptor for one physical database.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DataSourceDescriptor {
    /// Driver identifier.
    #[serde(default, alias = "driverClassName")]
    pub driver: String,
    /// Connection URL.
    pub url: String,
    /// Login user.
    #[serde(default, alias = "username")]
    pub user: String,
    /// Login password.
    #[serde(default)]
    pub password: String,
}

impl DataSourceDescriptor {
    /// Descriptor with the given URL and empty credentials.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

impl fmt::Debug for DataSourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSourceDescriptor")
            .field("driver", &self.driver)
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn default_db_count() -> u32 {
    1
}

/// Configuration of one shard group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardGroupConfig {
    /// Whether database/table splitting is active for this group.
    #[serde(default)]
    pub enable_split: bool,
    /// Number of physical databases.
    #[serde(default = "default_db_count")]
    pub db_count: u32,
    /// Logical table name -> partition count.
    #[serde(default)]
    pub tb_counts: BTreeMap<String, u32>,
    /// Default route key field name.
    #[serde(default, alias = "routeKey")]
    pub router_key: String,
    /// Physical databases by id.
    #[serde(default, alias = "dataSource")]
    pub datasources: BTreeMap<DbId, DataSourceDescriptor>,
}

impl Default for ShardGroupConfig {
    fn default() -> Self {
        Self {
            enable_split: false,
            db_count: 1,
            tb_counts: BTreeMap::new(),
            router_key: String::new(),
            datasources: BTreeMap::new(),
        }
    }
}

impl ShardGroupConfig {
    /// Split-enabled group with `db_count` databases routed by `router_key`.
    pub fn new(db_count: u32, router_key: impl Into<String>) -> Self {
        Self {
            enable_split: true,
            db_count,
            router_key: router_key.into(),
            ..Self::default()
        }
    }

    /// Group with splitting turned off (single database, base tables).
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Add a partitioned table.
    pub fn with_table(mut self, table: impl Into<String>, shard_count: u32) -> Self {
        self.tb_counts.insert(table.into(), shard_count);
        self
    }

    /// Add a physical database.
    pub fn with_datasource(mut self, db: DbId, descriptor: DataSourceDescriptor) -> Self {
        self.datasources.insert(db, descriptor);
        self
    }

    /// Largest partition count across the group's tables (1 when none).
    pub fn max_tb_count(&self) -> u32 {
        self.tb_counts.values().copied().max().unwrap_or(1)
    }

    /// Validate this group's settings.
    pub fn validate(&self, group: GroupId) -> Result<(), RouterError> {
        if self.db_count == 0 {
            return Err(RouterError::Configuration(format!(
                "{}: dbCount must be >= 1",
                group
            )));
        }

        if let Some((table, _)) = self.tb_counts.iter().find(|(_, count)| **count == 0) {
            return Err(RouterError::Configuration(format!(
                "{}: table '{}' must have at least one partition",
                group, table
            )));
        }

        if self.enable_split && self.router_key.trim().is_empty() {
            return Err(RouterError::Configuration(format!(
                "{}: routerKey is required when enableSplit is true",
                group
            )));
        }

        if let Some(db) = self.datasources.keys().find(|db| db.index() > self.db_count) {
            return Err(RouterError::Configuration(format!(
                "{}: datasource {} exceeds dbCount {}",
                group, db, self.db_count
            )));
        }

        Ok(())
    }
}

/// Complete router configuration: every shard group by id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Shard groups.
    #[serde(default)]
    pub groups: BTreeMap<GroupId, ShardGroupConfig>,
}

impl RouterConfig {
    /// Empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a group.
    pub fn with_group(mut self, group: GroupId, config: ShardGroupConfig) -> Self {
        self.groups.insert(group, config);
        self
    }

    /// Look up a group.
    pub fn group(&self, group: GroupId) -> Result<&ShardGroupConfig, RouterError> {
        self.groups
            .get(&group)
            .ok_or(RouterError::UnknownGroup(group))
    }

    /// Validate every group.
    pub fn validate(&self) -> Result<(), RouterError> {
        for (group, config) in &self.groups {
            config.validate(*group)?;
        }
        Ok(())
    }

    /// Parse and validate JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, RouterError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| RouterError::ConfigLoad(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RouterError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| RouterError::ConfigLoad(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&raw)
    }

    /// Load from the file named by `SDT_ROUTER_CONFIG`.
    pub fn from_env() -> Result<Self, RouterError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map_err(|_| RouterError::ConfigLoad(format!("{} is not set", CONFIG_PATH_ENV)))?;
        Self::from_json_file(path)
    }
}
