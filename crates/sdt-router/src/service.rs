//! Sharding Service - the router facade
//!
//! Wires configuration, the strategy registry and the three interception
//! points together, and wraps whole operations so their routing context is
//! always torn down.

use crate::adapters::{
    routing_context, DatasourceRegistry, DatasourceResolver, ShardingOrchestrator,
    StatementInterceptor,
};
use crate::algorithms::StrategyRegistry;
use crate::domain::{RouterConfig, RouterError, RoutingDecision, ShardIntent};
use crate::ports::{RouteKeySource, ShardingApi};
use sdt_telemetry::router_span;
use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, Instrument};
use uuid::Uuid;

/// Sharding router service.
#[derive(Clone, Debug)]
pub struct ShardingService {
    config: Arc<RouterConfig>,
    strategies: Arc<StrategyRegistry>,
    orchestrator: ShardingOrchestrator,
    interceptor: StatementInterceptor,
    resolver: DatasourceResolver,
    datasources: DatasourceRegistry,
}

impl ShardingService {
    /// Validate `config` and build a service with the built-in strategies.
    pub fn new(config: RouterConfig) -> Result<Self, RouterError> {
        Self::with_registry(config, StrategyRegistry::with_builtin())
    }

    /// Validate `config` and build a service over a custom registry.
    pub fn with_registry(
        config: RouterConfig,
        strategies: StrategyRegistry,
    ) -> Result<Self, RouterError> {
        config.validate()?;

        let datasources = DatasourceRegistry::from_config(&config);
        let config = Arc::new(config);
        let strategies = Arc::new(strategies);
        let interceptor = StatementInterceptor::new(Arc::clone(&config), Arc::clone(&strategies))
            .map_err(|e| RouterError::Configuration(e.to_string()))?;

        info!(
            groups = config.groups.len(),
            datasources = datasources.len(),
            strategies = ?strategies.kinds(),
            "[sdt] sharding service ready"
        );

        Ok(Self {
            orchestrator: ShardingOrchestrator::new(Arc::clone(&config), Arc::clone(&strategies)),
            interceptor,
            resolver: DatasourceResolver::new(),
            datasources,
            config,
            strategies,
        })
    }

    /// Build from the configuration file named by `SDT_ROUTER_CONFIG`.
    pub fn from_env() -> Result<Self, RouterError> {
        Self::new(RouterConfig::from_env()?)
    }

    /// Registered strategies.
    pub fn strategies(&self) -> &StrategyRegistry {
        &self.strategies
    }

    /// Configured datasources by connection key.
    pub fn datasources(&self) -> &DatasourceRegistry {
        &self.datasources
    }

    /// Run `op` as one routed operation.
    ///
    /// `op` receives the decision and runs inside a fresh routing context.
    /// Routing failures are returned without calling `op`. The context is
    /// dropped when the returned future completes or is dropped.
    pub async fn run<T, E, F, Fut>(
        &self,
        intent: &ShardIntent,
        args: &[&dyn RouteKeySource],
        op: F,
    ) -> Result<T, E>
    where
        F: FnOnce(RoutingDecision) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<RouterError>,
    {
        let operation_id = Uuid::new_v4();
        let span = router_span!(
            "sdt_operation",
            operation_id = %operation_id,
            group = intent.group,
            strategy = intent.strategy.label()
        );

        routing_context::scope(async move {
            routing_context::set_operation_id(operation_id)?;
            let decision = self.begin_operation(intent, args)?;
            let result = op(decision).await;
            self.end_operation();
            result
        })
        .instrument(span)
        .await
    }

    /// Blocking variant of [`ShardingService::run`].
    pub fn run_blocking<T, E, F>(
        &self,
        intent: &ShardIntent,
        args: &[&dyn RouteKeySource],
        op: F,
    ) -> Result<T, E>
    where
        F: FnOnce(RoutingDecision) -> Result<T, E>,
        E: From<RouterError>,
    {
        let operation_id = Uuid::new_v4();
        let span = router_span!(
            "sdt_operation",
            operation_id = %operation_id,
            group = intent.group,
            strategy = intent.strategy.label()
        );
        let _entered = span.enter();

        routing_context::sync_scope(|| {
            routing_context::set_operation_id(operation_id)?;
            let decision = self.begin_operation(intent, args)?;
            let result = op(decision);
            self.end_operation();
            result
        })
    }
}

impl ShardingApi for ShardingService {
    fn begin_operation(
        &self,
        intent: &ShardIntent,
        args: &[&dyn RouteKeySource],
    ) -> Result<RoutingDecision, RouterError> {
        self.orchestrator.begin_operation(intent, args)
    }

    fn end_operation(&self) {
        self.orchestrator.end_operation();
    }

    fn on_before_execute<'a>(&self, sql: &'a str) -> Cow<'a, str> {
        self.interceptor.on_before_execute(sql)
    }

    fn resolve_connection_key(&self) -> String {
        self.resolver.resolve_connection_key()
    }

    fn config(&self) -> &RouterConfig {
        &self.config
    }
}
