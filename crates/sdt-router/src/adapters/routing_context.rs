//! # Routing Context
//!
//! Task-local storage for the active [`RoutingDecision`].
//!
//! A decision exists only inside [`scope`] (async) or [`sync_scope`]
//! (blocking). The value is dropped when the scope exits, whether the
//! wrapped work returns, fails, panics or is cancelled, so a reused worker
//! never observes a previous operation's routing. Concurrent operations each
//! run in their own scope and never see each other's values.
//!
//! Setters fail with [`RouterError::NoActiveContext`] outside a scope;
//! getters return `None`.

use crate::domain::{DbId, GroupId, RouterError, RoutingDecision, StrategyKind, TableSuffix};
use std::cell::RefCell;
use std::future::Future;
use uuid::Uuid;

tokio::task_local! {
    static DECISION: RefCell<RoutingDecision>;
}

/// Run `fut` with a fresh routing context.
pub async fn scope<F: Future>(fut: F) -> F::Output {
    DECISION
        .scope(RefCell::new(RoutingDecision::begin()), fut)
        .await
}

/// Run `f` with a fresh routing context on the current thread.
pub fn sync_scope<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    DECISION.sync_scope(RefCell::new(RoutingDecision::begin()), f)
}

/// True inside a scope.
pub fn is_active() -> bool {
    DECISION.try_with(|_| ()).is_ok()
}

fn update<R>(f: impl FnOnce(&mut RoutingDecision) -> R) -> Result<R, RouterError> {
    DECISION
        .try_with(|cell| f(&mut cell.borrow_mut()))
        .map_err(|_| RouterError::NoActiveContext)
}

fn read<R>(f: impl FnOnce(&RoutingDecision) -> Option<R>) -> Option<R> {
    DECISION.try_with(|cell| f(&cell.borrow())).ok().flatten()
}

/// Set the shard group.
pub fn set_group(group: GroupId) -> Result<(), RouterError> {
    update(|d| d.group = Some(group))
}

/// Set the physical database.
pub fn set_db(db: DbId) -> Result<(), RouterError> {
    update(|d| d.db = Some(db))
}

/// Set or clear the table suffix.
pub fn set_table_suffix(suffix: Option<TableSuffix>) -> Result<(), RouterError> {
    update(|d| d.table_suffix = suffix)
}

/// Set the strategy kind.
pub fn set_strategy_kind(kind: StrategyKind) -> Result<(), RouterError> {
    update(|d| d.strategy = Some(kind))
}

/// Set or clear the business key value.
pub fn set_route_value(value: Option<String>) -> Result<(), RouterError> {
    update(|d| d.route_value = value)
}

/// Replace the operation id.
pub fn set_operation_id(id: Uuid) -> Result<(), RouterError> {
    update(|d| d.operation_id = Some(id))
}

/// Replace the whole decision.
pub fn replace(decision: RoutingDecision) -> Result<(), RouterError> {
    update(|d| *d = decision)
}

/// Current shard group.
pub fn group() -> Option<GroupId> {
    read(|d| d.group)
}

/// Current database.
pub fn db() -> Option<DbId> {
    read(|d| d.db)
}

/// Current table suffix.
pub fn table_suffix() -> Option<TableSuffix> {
    read(|d| d.table_suffix)
}

/// Current strategy kind.
pub fn strategy_kind() -> Option<StrategyKind> {
    read(|d| d.strategy)
}

/// Current business key value.
pub fn route_value() -> Option<String> {
    read(|d| d.route_value.clone())
}

/// Current operation id.
pub fn operation_id() -> Option<Uuid> {
    read(|d| d.operation_id)
}

/// Copy of the whole decision.
pub fn snapshot() -> Option<RoutingDecision> {
    read(|d| Some(d.clone()))
}

/// Reset every field. A no-op outside a scope.
pub fn clear_all() {
    let _ = update(RoutingDecision::clear);
}
