//! Prometheus metrics for the sharding router.
//!
//! All metrics follow the naming convention: `sdt_<metric>_total`
//!
//! - `sdt_routes_total{strategy}`: successful database routings
//! - `sdt_route_failures_total{reason}`: aborted routings
//! - `sdt_sql_rewrites_total{path}`: statements rewritten
//! - `sdt_rewrite_skipped_total{reason}`: statements left unmodified after
//!   a rewrite-stage failure

use lazy_static::lazy_static;
use prometheus::{CounterVec, Encoder, Opts, Registry, TextEncoder};

use crate::TelemetryError;

/// Router counters, registered in their own registry.
pub struct RouterMetrics {
    registry: Registry,
    routes: CounterVec,
    route_failures: CounterVec,
    sql_rewrites: CounterVec,
    rewrite_skipped: CounterVec,
}

impl RouterMetrics {
    /// Create and register every router counter.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let routes = CounterVec::new(
            Opts::new("sdt_routes_total", "Operations routed to a database"),
            &["strategy"],
        )?;
        let route_failures = CounterVec::new(
            Opts::new("sdt_route_failures_total", "Operations aborted during routing"),
            &["reason"],
        )?;
        let sql_rewrites = CounterVec::new(
            Opts::new("sdt_sql_rewrites_total", "Statements rewritten to a table partition"),
            &["path"], // structural / fallback
        )?;
        let rewrite_skipped = CounterVec::new(
            Opts::new(
                "sdt_rewrite_skipped_total",
                "Statements executed unmodified after a rewrite-stage failure",
            ),
            &["reason"],
        )?;

        registry.register(Box::new(routes.clone()))?;
        registry.register(Box::new(route_failures.clone()))?;
        registry.register(Box::new(sql_rewrites.clone()))?;
        registry.register(Box::new(rewrite_skipped.clone()))?;

        Ok(Self {
            registry,
            routes,
            route_failures,
            sql_rewrites,
            rewrite_skipped,
        })
    }
}

lazy_static! {
    /// Process-wide router metrics. `None` only if counter creation failed.
    static ref METRICS: Option<RouterMetrics> = RouterMetrics::new().ok();
}

fn metrics() -> Result<&'static RouterMetrics, TelemetryError> {
    METRICS
        .as_ref()
        .ok_or_else(|| TelemetryError::MetricsInit("router metrics unavailable".to_string()))
}

/// Force metric creation; reports a failure that recording would ignore.
pub fn register_metrics() -> Result<(), TelemetryError> {
    metrics().map(|_| ())
}

/// Count a successful routing by strategy label.
pub fn record_route(strategy: &str) {
    if let Some(m) = METRICS.as_ref() {
        m.routes.with_label_values(&[strategy]).inc();
    }
}

/// Count an aborted routing by error reason.
pub fn record_route_failure(reason: &str) {
    if let Some(m) = METRICS.as_ref() {
        m.route_failures.with_label_values(&[reason]).inc();
    }
}

/// Count a rewritten statement by rewrite path.
pub fn record_rewrite(path: &str) {
    if let Some(m) = METRICS.as_ref() {
        m.sql_rewrites.with_label_values(&[path]).inc();
    }
}

/// Count a statement left unmodified after a rewrite-stage failure.
pub fn record_rewrite_skipped(reason: &str) {
    if let Some(m) = METRICS.as_ref() {
        m.rewrite_skipped.with_label_values(&[reason]).inc();
    }
}

/// Current value of one labelled counter, for assertions and diagnostics.
pub fn counter_value(metric: &str, label: &str) -> f64 {
    let Some(m) = METRICS.as_ref() else {
        return 0.0;
    };
    let counter = match metric {
        "sdt_routes_total" => &m.routes,
        "sdt_route_failures_total" => &m.route_failures,
        "sdt_sql_rewrites_total" => &m.sql_rewrites,
        "sdt_rewrite_skipped_total" => &m.rewrite_skipped,
        _ => return 0.0,
    };
    counter.with_label_values(&[label]).get()
}

/// Encode all router metrics as Prometheus text format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = metrics()?.registry.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
