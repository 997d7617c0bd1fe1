//! # SDT Router Benchmarks
//!
//! Hot-path costs paid once per operation or once per statement:
//!
//! | Path | Frequency |
//! |------|-----------|
//! | Strategy `split_db` / `split_tb` | per operation / per statement |
//! | Ring construction | once per strategy instance |
//! | SQL rewrite (structural, fallback) | per statement |
//! | Full `run_blocking` lifecycle | per operation |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sdt_router::{
    ConsistentHashStrategy, GroupId, HashRing, HashStrategy, RouterConfig, RouterError,
    RouterStrategy, ShardGroupConfig, ShardIntent, ShardingApi, ShardingService, SqlTableRewriter,
    StrategyInput, TableShardCounts, TimeBasedStrategy,
};
use std::collections::HashMap;
use std::time::Duration;

// ============================================================================
// Strategies
// ============================================================================

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("strategies");
    group.measurement_time(Duration::from_secs(5));

    let hash = HashStrategy::new();
    let ring = ConsistentHashStrategy::new();
    ring.prewarm(8, 16);
    let time = TimeBasedStrategy::new();

    let input = StrategyInput::for_table("user-1234567", 8, 16);
    let time_input = StrategyInput::for_table("1700000000000", 8, 16);

    group.bench_function("hash_split_tb", |b| {
        b.iter(|| black_box(hash.split_tb(black_box(&input))))
    });
    group.bench_function("consistent_hash_split_db", |b| {
        b.iter(|| black_box(ring.split_db(black_box(&input))))
    });
    group.bench_function("time_based_split_tb", |b| {
        b.iter(|| black_box(time.split_tb(black_box(&time_input))))
    });

    for nodes in [4u32, 16, 64] {
        group.throughput(Throughput::Elements(u64::from(nodes) * 150));
        group.bench_with_input(BenchmarkId::new("ring_build", nodes), &nodes, |b, &nodes| {
            b.iter(|| black_box(HashRing::new(nodes)))
        });
    }

    group.finish();
}

// ============================================================================
// SQL rewriting
// ============================================================================

fn bench_sql_rewrite(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_rewrite");

    let rewriter = match SqlTableRewriter::new() {
        Ok(rewriter) => rewriter,
        Err(e) => panic!("rewriter: {}", e),
    };
    let tables: TableShardCounts = [("orders".to_string(), 8), ("order_items".to_string(), 8)]
        .into_iter()
        .collect();

    let statements = [
        ("simple", "SELECT * FROM orders WHERE id = 1"),
        (
            "join",
            "SELECT * FROM orders o JOIN order_items i ON o.id = i.order_id WHERE o.user_id = 7",
        ),
        (
            "union_subquery",
            "SELECT id FROM orders WHERE id IN (SELECT order_id FROM order_items) UNION ALL SELECT id FROM orders",
        ),
        ("fallback", "SELECT * FROM orders, order_items WHERE ("),
    ];

    for (name, sql) in statements {
        group.bench_with_input(BenchmarkId::new("rewrite", name), sql, |b, sql| {
            b.iter(|| black_box(rewriter.rewrite(black_box(sql), &tables, "003")))
        });
    }

    group.finish();
}

// ============================================================================
// Full lifecycle
// ============================================================================

fn bench_lifecycle(c: &mut Criterion) {
    let config = RouterConfig::new().with_group(
        GroupId::new(1),
        ShardGroupConfig::new(4, "userId").with_table("orders", 8),
    );
    let service = match ShardingService::new(config) {
        Ok(service) => service,
        Err(e) => panic!("service: {}", e),
    };
    let args = HashMap::from([("userId".to_string(), "user123".to_string())]);
    let intent = ShardIntent::group(1);

    c.bench_function("lifecycle_run_blocking", |b| {
        b.iter(|| {
            service.run_blocking(&intent, &[&args], |_| {
                let sql = service.on_before_execute("SELECT * FROM orders WHERE id = 1");
                Ok::<_, RouterError>(black_box(sql.len()))
            })
        })
    });
}

criterion_group!(benches, bench_strategies, bench_sql_rewrite, bench_lifecycle);

criterion_main!(benches);
