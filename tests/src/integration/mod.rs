//! Cross-component router tests.

pub mod flows;
pub mod isolation;

use sdt_router::{RouterConfig, ShardingService};

/// Two groups: `group01` splits orders over 4 databases and 8 tables,
/// `group02` is unsplit.
pub const SAMPLE_CONFIG: &str = r#"{
    "groups": {
        "group01": {
            "enableSplit": true,
            "dbCount": 4,
            "tbCounts": { "orders": 8, "order_items": 8, "users": 1 },
            "routerKey": "userId",
            "datasources": {
                "db01": { "driver": "mysql", "url": "mysql://shard-a/db01", "user": "app", "password": "s1" },
                "db04": { "driver": "mysql", "url": "mysql://shard-d/db04", "user": "app", "password": "s4" }
            }
        },
        "group02": {
            "enableSplit": false,
            "dbCount": 1,
            "tbCounts": { "orders": 8 },
            "routerKey": ""
        }
    }
}"#;

/// Service built from [`SAMPLE_CONFIG`].
pub fn sample_service() -> ShardingService {
    let config = RouterConfig::from_json_str(SAMPLE_CONFIG)
        .unwrap_or_else(|e| panic!("sample config rejected: {}", e));
    ShardingService::new(config).unwrap_or_else(|e| panic!("sample service rejected: {}", e))
}
