//! # Isolation and Stability
//!
//! Routing state must never leak between operations:
//! - concurrent operations on a multi-threaded runtime see only their own decision
//! - cancelled, timed-out and panicking operations leave no context behind
//!
//! Shared strategy state must stay stable:
//! - the consistent-hash ring is reused across groups until reset
//! - growing a ring by one node moves only the keys the new node takes over

#[cfg(test)]
mod tests {
    use super::super::sample_service;
    use rand::distributions::Alphanumeric;
    use rand::Rng;
    use sdt_router::{
        routing_context, DbId, GroupId, HashRing, RouterConfig, RouterError, ShardGroupConfig,
        ShardIntent, ShardingApi, ShardingService, StrategyKind, DEFAULT_CONNECTION_KEY,
    };
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn user(user_id: &str) -> HashMap<String, String> {
        HashMap::from([("userId".to_string(), user_id.to_string())])
    }

    // =============================================================================
    // CONCURRENCY
    // =============================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_operations_are_isolated() {
        let service = Arc::new(sample_service());

        let handles: Vec<_> = (0..64)
            .map(|i| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    let key = format!("user-{}", i);
                    let args = user(&key);
                    service
                        .run(&ShardIntent::group(1), &[&args], |decision| {
                            let service = &service;
                            async move {
                                let expected = decision.connection_key();
                                tokio::time::sleep(Duration::from_millis((i % 7) as u64)).await;
                                let sql = service.on_before_execute("SELECT * FROM orders");
                                tokio::task::yield_now().await;

                                assert_eq!(Some(service.resolve_connection_key()), expected);
                                assert_eq!(routing_context::route_value(), Some(key.clone()));
                                Ok::<_, RouterError>((key, decision.db, sql.into_owned()))
                            }
                        })
                        .await
                })
            })
            .collect();

        let reference = sample_service();
        for handle in handles {
            let (key, db, sql) = handle.await.unwrap().unwrap();

            // Same answer as an uncontended run
            let solo_db = reference
                .run_blocking(&ShardIntent::group(1), &[&user(&key)], |decision| {
                    Ok::<_, RouterError>(decision.db)
                })
                .unwrap();
            assert_eq!(db, solo_db);
            assert!(sql.starts_with("SELECT * FROM orders_"));
        }
    }

    #[tokio::test]
    async fn test_worker_scope_serves_successive_operations() {
        let service = sample_service();

        // One scope per worker, begin/end per request
        let keys = routing_context::scope(async {
            let mut keys = Vec::new();
            for (group, user_id) in [(1, "user123"), (2, "ignored"), (1, "user123")] {
                let args = user(user_id);
                let decision = service
                    .begin_operation(&ShardIntent::group(group), &[&args])
                    .unwrap();
                tokio::task::yield_now().await;
                keys.push((decision.operation_id, service.resolve_connection_key()));
                service.end_operation();
                assert_eq!(service.resolve_connection_key(), DEFAULT_CONNECTION_KEY);
            }
            keys
        })
        .await;

        let connections: Vec<_> = keys.iter().map(|(_, key)| key.as_str()).collect();
        assert_eq!(connections, vec!["group01db04", "group02db01", "group01db04"]);
        assert_ne!(keys[0].0, keys[2].0);
    }

    // =============================================================================
    // CANCELLATION
    // =============================================================================

    #[tokio::test(flavor = "current_thread")]
    async fn test_aborted_operation_leaves_no_context() {
        let service = Arc::new(sample_service());
        let (started_tx, started_rx) = oneshot::channel();

        let handle = tokio::spawn({
            let service = Arc::clone(&service);
            async move {
                let args = user("user123");
                service
                    .run(&ShardIntent::group(1), &[&args], |_| async move {
                        let key = routing_context::snapshot().and_then(|d| d.connection_key());
                        let _ = started_tx.send(key);
                        std::future::pending::<()>().await;
                        Ok::<_, RouterError>(())
                    })
                    .await
            }
        });

        assert_eq!(started_rx.await.unwrap().as_deref(), Some("group01db04"));
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());

        // The next task on the same worker starts clean
        let reused = tokio::spawn({
            let service = Arc::clone(&service);
            async move { (routing_context::is_active(), service.resolve_connection_key()) }
        });
        assert_eq!(reused.await.unwrap(), (false, DEFAULT_CONNECTION_KEY.to_string()));
    }

    #[tokio::test]
    async fn test_timed_out_operation_leaves_no_context() {
        let service = sample_service();
        let args = user("user123");

        let result = tokio::time::timeout(
            Duration::from_millis(20),
            service.run(&ShardIntent::group(1), &[&args], |_| async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok::<_, RouterError>(())
            }),
        )
        .await;

        assert!(result.is_err());
        assert!(!routing_context::is_active());
        assert_eq!(service.resolve_connection_key(), DEFAULT_CONNECTION_KEY);
    }

    #[test]
    fn test_panicking_operation_leaves_no_context() {
        let service = sample_service();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            service.run_blocking(
                &ShardIntent::group(1),
                &[&user("user123")],
                |_| -> Result<(), RouterError> {
                    assert!(routing_context::is_active());
                    panic!("statement failed")
                },
            )
        }));

        assert!(result.is_err());
        assert!(!routing_context::is_active());
        assert_eq!(service.resolve_connection_key(), DEFAULT_CONNECTION_KEY);
    }

    // =============================================================================
    // SHARED RING STATE
    // =============================================================================

    #[test]
    fn test_consistent_hash_ring_shared_until_reset() {
        let config = RouterConfig::new()
            .with_group(GroupId::new(1), ShardGroupConfig::new(3, "orderId"))
            .with_group(GroupId::new(2), ShardGroupConfig::new(5, "orderId"));
        let service = ShardingService::new(config).unwrap();
        let args = HashMap::from([("orderId".to_string(), "order-42".to_string())]);

        let route = |group: u32| {
            service
                .run_blocking(
                    &ShardIntent::group(group).strategy(StrategyKind::ConsistentHash),
                    &[&args],
                    |decision| Ok::<_, RouterError>(decision.db),
                )
                .unwrap()
        };

        // The 3-node ring built first also serves the 5-database group
        assert_eq!(route(1), Some(DbId::new(2)));
        assert_eq!(route(2), Some(DbId::new(2)));

        service.strategies().reset_all();
        assert_eq!(route(2), Some(DbId::new(4)));
    }

    #[test]
    fn test_ring_growth_moves_bounded_fraction() {
        let mut rng = rand::thread_rng();
        let keys: Vec<String> = (0..2000)
            .map(|_| {
                (0..12)
                    .map(|_| rng.sample(Alphanumeric) as char)
                    .collect()
            })
            .collect();

        let before = HashRing::new(4);
        let after = HashRing::new(5);

        let moved: Vec<_> = keys
            .iter()
            .filter(|key| before.locate(key) != after.locate(key))
            .collect();

        let fraction = moved.len() as f64 / keys.len() as f64;
        assert!(fraction > 0.1 && fraction < 0.3, "moved fraction {}", fraction);
        assert!(moved.iter().all(|key| after.locate(key) == 5));
    }
}
