use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;

use outletops_auth::{Action, Actor, RoleGate};
use outletops_core::{AggregateRoot, DomainError, DomainResult, ExpectedVersion, OrderId, OutletId};
use outletops_events::{NotificationEmitter, execute};
use outletops_orders::{
    ChangeOrderStatus, Order, OrderCommand, OrderEvent, OrderItem, OrderKind, OrderLineInput, OrderStatus,
    PlaceCustomerOrder, RequestFactoryOrder,
};

use super::catalog::CatalogService;
use super::emit_all;
use super::ledger::InventoryLedger;
use crate::repository::Repository;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomerOrder {
    pub outlet_id: OutletId,
    pub items: Vec<OrderLineInput>,
    pub customer_name: String,
    pub customer_phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFactoryOrder {
    pub outlet_id: OutletId,
    pub items: Vec<OrderLineInput>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFilter {
    pub outlet_id: Option<OutletId>,
    pub kind: Option<OrderKind>,
    pub status: Option<OrderStatus>,
}

impl OrderFilter {
    fn matches(&self, order: &Order) -> bool {
        self.outlet_id.is_none_or(|o| o == order.outlet_id())
            && self.kind.is_none_or(|k| k == order.kind())
            && self.status.is_none_or(|s| s == order.status())
    }
}

fn transition_action(kind: OrderKind) -> Action {
    match kind {
        OrderKind::Customer => Action::TransitionCustomerOrder,
        OrderKind::Factory => Action::TransitionFactoryOrder,
    }
}

/// Customer and factory order lifecycle.
///
/// Ordering of side effects: the step that can fail on business grounds runs
/// first, and any compensation is a stock credit.
pub struct OrderService {
    orders: Arc<dyn Repository<Order>>,
    catalog: Arc<CatalogService>,
    ledger: Arc<InventoryLedger>,
    gate: RoleGate,
    emitter: Arc<dyn NotificationEmitter>,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn Repository<Order>>,
        catalog: Arc<CatalogService>,
        ledger: Arc<InventoryLedger>,
        emitter: Arc<dyn NotificationEmitter>,
    ) -> Self {
        Self {
            orders,
            catalog,
            ledger,
            gate: RoleGate::new(),
            emitter,
        }
    }

    /// Snapshot catalog prices onto the requested lines.
    fn price_lines(&self, lines: &[OrderLineInput]) -> DomainResult<Vec<OrderItem>> {
        lines
            .iter()
            .map(|line| {
                let product = self.catalog.require_orderable(line.product_id)?;
                OrderItem::priced(
                    line.product_id,
                    line.quantity,
                    product.unit_price(),
                    line.discount_per_unit,
                )
            })
            .collect()
    }

    pub fn create_customer_order(&self, actor: &Actor, new: NewCustomerOrder) -> DomainResult<Order> {
        let outlet_id = new.outlet_id;
        self.gate.check(actor, Action::PlaceCustomerOrder, Some(outlet_id))?;
        self.catalog.require_open_outlet(outlet_id)?;

        let items = self.price_lines(&new.items)?;
        let order_id = OrderId::new();
        let mut order = Order::empty(order_id);
        let events = execute(
            &mut order,
            &OrderCommand::PlaceCustomerOrder(PlaceCustomerOrder {
                order_id,
                outlet_id,
                items,
                customer_name: new.customer_name,
                customer_phone: new.customer_phone,
                occurred_at: Utc::now(),
            }),
        )?;

        self.ledger
            .apply_batch(outlet_id, &order.stock_deltas(true))
            .inspect_err(|e| tracing::warn!(outlet_id = %outlet_id, "customer order rejected: {e}"))?;

        if let Err(e) = self.orders.save(order.clone(), ExpectedVersion::NoStream) {
            self.release_stock(&order, "customer order persist failed");
            return Err(e.into());
        }

        tracing::info!(order_id = %order_id, outlet_id = %outlet_id, total = order.total(), "customer order placed");
        emit_all(self.emitter.as_ref(), &events, "order", order_id, Some(outlet_id));
        Ok(order)
    }

    pub fn create_factory_order(&self, actor: &Actor, new: NewFactoryOrder) -> DomainResult<Order> {
        let outlet_id = new.outlet_id;
        self.gate.check(actor, Action::RequestFactoryOrder, Some(outlet_id))?;
        self.catalog.require_open_outlet(outlet_id)?;

        let items = self.price_lines(&new.items)?;
        let order_id = OrderId::new();
        let mut order = Order::empty(order_id);
        let events = execute(
            &mut order,
            &OrderCommand::RequestFactoryOrder(RequestFactoryOrder {
                order_id,
                outlet_id,
                items,
                occurred_at: Utc::now(),
            }),
        )?;
        self.orders.save(order.clone(), ExpectedVersion::NoStream)?;

        tracing::info!(order_id = %order_id, outlet_id = %outlet_id, "factory order requested");
        emit_all(self.emitter.as_ref(), &events, "order", order_id, Some(outlet_id));
        Ok(order)
    }

    /// Move an order along its kind's transition table.
    ///
    /// Setting the current status again returns the order unchanged, except
    /// for a second delivery, which is `InvalidTransition`. Status
    /// changes that put stock back (delivery, cancelling a debited customer
    /// order) credit first, then save with a version check; a lost race
    /// takes the credit back, so stock is credited at most once.
    pub fn set_status(&self, actor: &Actor, order_id: OrderId, status: OrderStatus) -> DomainResult<Order> {
        let current = self.load(order_id)?;
        self.gate
            .check(actor, transition_action(current.kind()), Some(current.outlet_id()))?;

        let expected = ExpectedVersion::Exact(current.version());
        let mut next = current;
        let events = execute(
            &mut next,
            &OrderCommand::ChangeOrderStatus(ChangeOrderStatus {
                order_id,
                status,
                occurred_at: Utc::now(),
            }),
        )
        .inspect_err(|e| tracing::warn!(order_id = %order_id, "order transition rejected: {e}"))?;

        if events.is_empty() {
            return Ok(next);
        }

        let credits_stock = events.iter().any(|e| match e {
            OrderEvent::OrderDelivered(_) => true,
            OrderEvent::OrderCancelled(c) => c.stock_released,
            _ => false,
        });
        if credits_stock {
            self.ledger
                .apply_batch(next.outlet_id(), &next.stock_deltas(false))
                .inspect_err(|e| {
                    tracing::warn!(order_id = %order_id, "stock credit for {status} rejected: {e}")
                })?;
        }

        if let Err(e) = self.orders.save(next.clone(), expected) {
            if credits_stock {
                if let Err(ce) = self.ledger.apply_batch(next.outlet_id(), &next.stock_deltas(true)) {
                    tracing::error!(order_id = %order_id, "stock compensation failed: {ce}");
                }
            }
            return Err(e.into());
        }

        tracing::info!(order_id = %order_id, %status, "order status changed");
        emit_all(self.emitter.as_ref(), &events, "order", order_id, Some(next.outlet_id()));
        Ok(next)
    }

    pub fn get_order(&self, actor: &Actor, order_id: OrderId) -> DomainResult<Order> {
        let order = self.load(order_id)?;
        self.gate.check(actor, Action::ViewOrders, Some(order.outlet_id()))?;
        Ok(order)
    }

    /// Orders visible to the actor; outlet staff only see their own outlet.
    pub fn list_orders(&self, actor: &Actor, filter: &OrderFilter) -> DomainResult<Vec<Order>> {
        if let Some(outlet_id) = filter.outlet_id {
            self.gate.check(actor, Action::ViewOrders, Some(outlet_id))?;
        }

        let orders = self
            .orders
            .list()?
            .into_iter()
            .filter(|o| filter.matches(o))
            .filter(|o| self.gate.can_view(actor, Action::ViewOrders, o.outlet_id()))
            .collect();
        Ok(orders)
    }

    fn load(&self, order_id: OrderId) -> DomainResult<Order> {
        self.orders
            .get(&order_id)?
            .ok_or_else(|| DomainError::not_found("order", order_id))
    }

    fn release_stock(&self, order: &Order, reason: &str) {
        if let Err(e) = self.ledger.apply_batch(order.outlet_id(), &order.stock_deltas(false)) {
            tracing::error!(order_id = %order.id_typed(), reason, "stock compensation failed: {e}");
        }
    }
}
