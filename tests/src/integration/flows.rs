//! # Integration Test Flows
//!
//! Full operation lifecycle through [`ShardingService`]: orchestrator,
//! statement interceptor and datasource resolver sharing one routing context.
//!
//! ## Flows Tested:
//!
//! 1. **Routed operation**: key -> database -> table partition -> connection
//! 2. **Unsplit group**: fixed `db01`, SQL byte-identical
//! 3. **Abort vs fail-open**: begin-stage errors surface, statement-stage errors do not
//!
//! [`ShardingService`]: sdt_router::ShardingService

#[cfg(test)]
mod tests {
    use super::super::sample_service;
    use sdt_router::{
        ports::FixedStrategy, routing_context, DbId, KeyFn, RouterConfig, RouterError,
        ShardIntent, ShardingApi, ShardingService, StrategyKind, StrategyRegistry, TableSuffix,
    };
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn user(user_id: &str) -> HashMap<String, String> {
        HashMap::from([("userId".to_string(), user_id.to_string())])
    }

    // =============================================================================
    // ROUTED OPERATION
    // =============================================================================

    #[tokio::test]
    async fn test_routed_operation_end_to_end() {
        let service = sample_service();
        let args = user("user123");

        let (decision, key, url, sql) = service
            .run(&ShardIntent::group(1), &[&args], |decision| {
                let service = &service;
                async move {
                    let sql = service
                        .on_before_execute(
                            "SELECT * FROM orders o JOIN order_items i ON o.id = i.order_id JOIN users u ON u.id = o.user_id",
                        )
                        .into_owned();
                    let key = service.resolve_connection_key();
                    let url = service.datasources().resolve_current().map(|d| d.url.clone());
                    Ok::<_, RouterError>((routing_context::snapshot(), key, url, sql))
                }
            })
            .await
            .unwrap();

        let decision = decision.unwrap();
        assert_eq!(decision.db, Some(DbId::new(4)));
        assert_eq!(decision.table_suffix, Some(TableSuffix::new(1)));
        assert_eq!(key, "group01db04");
        assert_eq!(url.as_deref(), Some("mysql://shard-d/db04"));
        assert_eq!(
            sql,
            "SELECT * FROM orders_001 o JOIN order_items_001 i ON o.id = i.order_id JOIN users u ON u.id = o.user_id"
        );

        // Context is gone once the operation returns
        assert_eq!(service.resolve_connection_key(), "group01db01");
    }

    #[tokio::test]
    async fn test_every_statement_observes_same_decision() {
        let service = sample_service();
        let label = "checkout".to_string();
        let args = json!({ "userId": "order-owner-9", "amount": 12 });

        let statements = service
            .run(&ShardIntent::group(1), &[&label, &args], |_| {
                let service = &service;
                async move {
                    let mut out = Vec::new();
                    for sql in [
                        "INSERT INTO orders (id, user_id) VALUES (1, 'order-owner-9')",
                        "UPDATE orders SET amount = 12 WHERE id = 1",
                        "DELETE FROM order_items WHERE order_id = 1",
                    ] {
                        out.push(service.on_before_execute(sql).into_owned());
                        tokio::task::yield_now().await;
                        out.push(service.resolve_connection_key());
                    }
                    Ok::<_, RouterError>(out)
                }
            })
            .await
            .unwrap();

        let keys: Vec<_> = statements.iter().skip(1).step_by(2).collect();
        assert!(keys.windows(2).all(|w| w[0] == w[1]));

        let suffixes: Vec<_> = statements
            .iter()
            .step_by(2)
            .filter_map(|sql| sql.split("orders_").nth(1).or_else(|| sql.split("order_items_").nth(1)))
            .map(|rest| rest[..3].to_string())
            .collect();
        assert_eq!(suffixes.len(), 3);
        assert!(suffixes.windows(2).all(|w| w[0] == w[1]));
    }

    #[tokio::test]
    async fn test_time_based_seconds_and_millis_agree() {
        let service = sample_service();
        let intent = ShardIntent::group(1).strategy(StrategyKind::TimeBased);

        let mut results = Vec::new();
        for created in ["1700000000", "1700000000000"] {
            let args = KeyFn(move |field: &str| (field == "createdAt").then(|| created.to_string()));
            let intent = intent.clone().route_key("createdAt");
            let result = service
                .run(&intent, &[&args], |decision| {
                    let service = &service;
                    async move {
                        let sql = service.on_before_execute("SELECT * FROM orders").into_owned();
                        Ok::<_, RouterError>((decision.db, sql))
                    }
                })
                .await
                .unwrap();
            results.push(result);
        }

        assert_eq!(results[0], results[1]);
        assert_ne!(results[0].1, "SELECT * FROM orders");
    }

    // =============================================================================
    // UNSPLIT GROUP
    // =============================================================================

    #[test]
    fn test_disabled_group_leaves_sql_untouched() {
        let service = sample_service();
        let statements = [
            "SELECT * FROM orders WHERE id = 1",
            "insert into orders (id) values (1)",
            "SELECT * FROM orders, order_items WHERE (",
        ];

        for sql in statements {
            let (key, out) = service
                .run_blocking(&ShardIntent::group(2), &[], |decision| {
                    assert_eq!(decision.db, Some(DbId::new(1)));
                    assert_eq!(decision.route_value, None);
                    Ok::<_, RouterError>((
                        service.resolve_connection_key(),
                        service.on_before_execute(sql).into_owned(),
                    ))
                })
                .unwrap();
            assert_eq!(key, "group02db01");
            assert_eq!(out.as_bytes(), sql.as_bytes());
        }
    }

    // =============================================================================
    // ABORT VS FAIL-OPEN
    // =============================================================================

    #[tokio::test]
    async fn test_unknown_group_aborts_before_operation() {
        let service = sample_service();
        let before = sdt_telemetry::counter_value("sdt_route_failures_total", "unknown_group");

        let mut ran = false;
        let result = service
            .run(&ShardIntent::group(5), &[], |_| {
                ran = true;
                async { Ok::<_, RouterError>(()) }
            })
            .await;

        assert!(matches!(result, Err(ref e) if e.is_configuration()));
        assert!(!ran);
        assert!(sdt_telemetry::counter_value("sdt_route_failures_total", "unknown_group") > before);
    }

    #[tokio::test]
    async fn test_missing_route_value_aborts() {
        let service = sample_service();
        let args = json!({ "userId": null, "orderId": "o-1" });

        let result = service
            .run(&ShardIntent::group(1), &[&args], |_| async { Ok::<_, RouterError>(()) })
            .await;

        assert_eq!(
            result,
            Err(RouterError::RoutingValue {
                route_key: "userId".to_string()
            })
        );
    }

    #[test]
    fn test_statement_stage_failure_fails_open() {
        let config = RouterConfig::from_json_str(super::super::SAMPLE_CONFIG).unwrap();
        let mut strategies = StrategyRegistry::with_builtin();
        strategies.register(Arc::new(FixedStrategy::failing_tables(
            StrategyKind::Custom1,
            DbId::new(2),
        )));
        let service = ShardingService::with_registry(config, strategies).unwrap();
        let before = sdt_telemetry::counter_value("sdt_rewrite_skipped_total", "invalid_input");

        let sql = "SELECT * FROM orders WHERE user_id = 'u-1'";
        let (key, out) = service
            .run_blocking(
                &ShardIntent::group(1).strategy(StrategyKind::Custom1),
                &[&user("u-1")],
                |_| Ok::<_, RouterError>((service.resolve_connection_key(), service.on_before_execute(sql).into_owned())),
            )
            .unwrap();

        // Database stage succeeded, table stage fell back to the base table
        assert_eq!(key, "group01db02");
        assert_eq!(out, sql);
        assert!(sdt_telemetry::counter_value("sdt_rewrite_skipped_total", "invalid_input") > before);
    }

    #[test]
    fn test_unparseable_sql_uses_keyword_fallback() {
        let service = sample_service();
        let before = sdt_telemetry::counter_value("sdt_sql_rewrites_total", "fallback");

        let out = service
            .run_blocking(&ShardIntent::group(1), &[&user("user123")], |_| {
                Ok::<_, RouterError>(
                    service
                        .on_before_execute("SELECT * FROM orders, order_items WHERE (")
                        .into_owned(),
                )
            })
            .unwrap();

        // Only the name right after FROM qualifies on the fallback path
        assert_eq!(out, "SELECT * FROM orders_001, order_items WHERE (");
        assert!(sdt_telemetry::counter_value("sdt_sql_rewrites_total", "fallback") > before);
    }
}
