//! Application services: the only code paths that mutate state.

pub mod catalog;
pub mod ledger;
pub mod orders;
pub mod returns;

use std::sync::Arc;

use serde::Serialize;

use outletops_catalog::{Outlet, Product};
use outletops_core::{Aggregate, AggregateRoot, DomainError, DomainResult, ExpectedVersion, OutletId};
use outletops_events::{Event, Notification, NotificationEmitter, execute};
use outletops_orders::Order;
use outletops_returns::Return;

use crate::repository::{InMemoryRepository, Repository};
use crate::stock_store::{InMemoryStockStore, StockStore};

pub use catalog::{CatalogService, NewOutlet, NewProduct};
pub use ledger::InventoryLedger;
pub use orders::{NewCustomerOrder, NewFactoryOrder, OrderFilter, OrderService};
pub use returns::{NewReturn, ReturnFilter, ReturnService};

/// Load an aggregate, run one command and store the result with a version
/// check. A command that yields no events stores nothing.
pub(crate) fn execute_and_save<A>(
    repo: &dyn Repository<A>,
    entity: &'static str,
    id: &A::Id,
    command: &A::Command,
) -> DomainResult<(A, Vec<A::Event>)>
where
    A: Aggregate<Error = DomainError> + Clone,
    A::Id: core::fmt::Display,
{
    let current = repo.get(id)?.ok_or_else(|| DomainError::not_found(entity, id))?;
    let expected = ExpectedVersion::Exact(current.version());

    let mut next = current;
    let events = execute(&mut next, command)?;
    if !events.is_empty() {
        repo.save(next.clone(), expected)?;
    }
    Ok((next, events))
}

/// Create a new aggregate from an empty instance; fails if the id is taken.
pub(crate) fn create_and_save<A>(
    repo: &dyn Repository<A>,
    mut empty: A,
    command: &A::Command,
) -> DomainResult<(A, Vec<A::Event>)>
where
    A: Aggregate<Error = DomainError> + Clone,
{
    let events = execute(&mut empty, command)?;
    repo.save(empty.clone(), ExpectedVersion::NoStream)?;
    Ok((empty, events))
}

pub(crate) fn emit_all<E>(
    emitter: &dyn NotificationEmitter,
    events: &[E],
    aggregate_type: &str,
    aggregate_id: impl ToString,
    outlet_id: Option<OutletId>,
) where
    E: Event + Serialize,
{
    let aggregate_id = aggregate_id.to_string();
    for event in events {
        emitter.emit(Notification::from_event(
            event,
            aggregate_type,
            aggregate_id.clone(),
            outlet_id,
        ));
    }
}

/// Every service wired over in-memory storage.
#[derive(Clone)]
pub struct ServiceRegistry {
    pub catalog: Arc<CatalogService>,
    pub ledger: Arc<InventoryLedger>,
    pub orders: Arc<OrderService>,
    pub returns: Arc<ReturnService>,
}

impl ServiceRegistry {
    pub fn in_memory(emitter: Arc<dyn NotificationEmitter>, low_stock_threshold: i64) -> Self {
        let products: Arc<dyn Repository<Product>> = Arc::new(InMemoryRepository::<Product>::new());
        let outlets: Arc<dyn Repository<Outlet>> = Arc::new(InMemoryRepository::<Outlet>::new());
        let orders: Arc<dyn Repository<Order>> = Arc::new(InMemoryRepository::<Order>::new());
        let returns: Arc<dyn Repository<Return>> = Arc::new(InMemoryRepository::<Return>::new());
        let stock: Arc<dyn StockStore> = Arc::new(InMemoryStockStore::new());

        Self::new(products, outlets, orders, returns, stock, emitter, low_stock_threshold)
    }

    pub fn new(
        products: Arc<dyn Repository<Product>>,
        outlets: Arc<dyn Repository<Outlet>>,
        orders: Arc<dyn Repository<Order>>,
        returns: Arc<dyn Repository<Return>>,
        stock: Arc<dyn StockStore>,
        emitter: Arc<dyn NotificationEmitter>,
        low_stock_threshold: i64,
    ) -> Self {
        let catalog = Arc::new(CatalogService::new(products, outlets, emitter.clone()));
        let ledger = Arc::new(InventoryLedger::new(
            stock,
            catalog.clone(),
            emitter.clone(),
            low_stock_threshold,
        ));
        let orders = Arc::new(OrderService::new(
            orders,
            catalog.clone(),
            ledger.clone(),
            emitter.clone(),
        ));
        let returns = Arc::new(ReturnService::new(returns, catalog.clone(), ledger.clone(), emitter));

        Self {
            catalog,
            ledger,
            orders,
            returns,
        }
    }
}
