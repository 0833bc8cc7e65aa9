use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use outletops_core::{Aggregate, AggregateRoot, DomainError, OrderId, OutletId, ProductId};
use outletops_events::Event;

use crate::item::{OrderItem, order_total};
use crate::status::{OrderKind, OrderStatus};

/// Aggregate root: Order (customer or factory).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: OrderId,
    outlet_id: OutletId,
    kind: OrderKind,
    items: Vec<OrderItem>,
    status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer_phone: Option<String>,
    total: u64,
    /// Stock for the items is currently debited from the outlet.
    stock_committed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delivered_at: Option<DateTime<Utc>>,
    version: u64,
    #[serde(skip)]
    created: bool,
}

impl Order {
    pub fn empty(id: OrderId) -> Self {
        Self {
            id,
            outlet_id: OutletId::from_uuid(Default::default()),
            kind: OrderKind::Customer,
            items: Vec::new(),
            status: OrderStatus::Pending,
            customer_name: None,
            customer_phone: None,
            total: 0,
            stock_committed: false,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
            completed_at: None,
            delivered_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn outlet_id(&self) -> OutletId {
        self.outlet_id
    }

    pub fn kind(&self) -> OrderKind {
        self.kind
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn customer_name(&self) -> Option<&str> {
        self.customer_name.as_deref()
    }

    pub fn customer_phone(&self) -> Option<&str> {
        self.customer_phone.as_deref()
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn stock_committed(&self) -> bool {
        self.stock_committed
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Signed ledger deltas for the items: `-quantity` per line when
    /// `debit`, `+quantity` otherwise.
    pub fn stock_deltas(&self, debit: bool) -> Vec<(ProductId, i64)> {
        self.items
            .iter()
            .map(|i| (i.product_id, if debit { -i.quantity } else { i.quantity }))
            .collect()
    }
}

impl AggregateRoot for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: PlaceCustomerOrder.
///
/// Issued once stock for the items has been debited, so the order starts
/// `Confirmed` with `stock_committed` set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceCustomerOrder {
    pub order_id: OrderId,
    pub outlet_id: OutletId,
    pub items: Vec<OrderItem>,
    pub customer_name: String,
    pub customer_phone: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RequestFactoryOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFactoryOrder {
    pub order_id: OrderId,
    pub outlet_id: OutletId,
    pub items: Vec<OrderItem>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ChangeOrderStatus. Same status is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeOrderStatus {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderCommand {
    PlaceCustomerOrder(PlaceCustomerOrder),
    RequestFactoryOrder(RequestFactoryOrder),
    ChangeOrderStatus(ChangeOrderStatus),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerOrderPlaced {
    pub order_id: OrderId,
    pub outlet_id: OutletId,
    pub items: Vec<OrderItem>,
    pub customer_name: String,
    pub customer_phone: String,
    pub total: u64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactoryOrderRequested {
    pub order_id: OrderId,
    pub outlet_id: OutletId,
    pub items: Vec<OrderItem>,
    pub total: u64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmed {
    pub order_id: OrderId,
    pub outlet_id: OutletId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCompleted {
    pub order_id: OrderId,
    pub outlet_id: OutletId,
    pub total: u64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCancelled {
    pub order_id: OrderId,
    pub outlet_id: OutletId,
    pub kind: OrderKind,
    /// Previously debited stock must be credited back.
    pub stock_released: bool,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDelivered {
    pub order_id: OrderId,
    pub outlet_id: OutletId,
    pub items: Vec<OrderItem>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    CustomerOrderPlaced(CustomerOrderPlaced),
    FactoryOrderRequested(FactoryOrderRequested),
    OrderConfirmed(OrderConfirmed),
    OrderCompleted(OrderCompleted),
    OrderCancelled(OrderCancelled),
    OrderDelivered(OrderDelivered),
}

impl Event for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::CustomerOrderPlaced(_) => "orders.customer_order.placed",
            OrderEvent::FactoryOrderRequested(_) => "orders.factory_order.requested",
            OrderEvent::OrderConfirmed(_) => "orders.order.confirmed",
            OrderEvent::OrderCompleted(_) => "orders.order.completed",
            OrderEvent::OrderCancelled(_) => "orders.order.cancelled",
            OrderEvent::OrderDelivered(_) => "orders.order.delivered",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::CustomerOrderPlaced(e) => e.occurred_at,
            OrderEvent::FactoryOrderRequested(e) => e.occurred_at,
            OrderEvent::OrderConfirmed(e) => e.occurred_at,
            OrderEvent::OrderCompleted(e) => e.occurred_at,
            OrderEvent::OrderCancelled(e) => e.occurred_at,
            OrderEvent::OrderDelivered(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Order {
    type Command = OrderCommand;
    type Event = OrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            OrderEvent::CustomerOrderPlaced(e) => {
                self.id = e.order_id;
                self.outlet_id = e.outlet_id;
                self.kind = OrderKind::Customer;
                self.items = e.items.clone();
                self.status = OrderStatus::Confirmed;
                self.customer_name = Some(e.customer_name.clone());
                self.customer_phone = Some(e.customer_phone.clone());
                self.total = e.total;
                self.stock_committed = true;
                self.created_at = e.occurred_at;
                self.created = true;
            }
            OrderEvent::FactoryOrderRequested(e) => {
                self.id = e.order_id;
                self.outlet_id = e.outlet_id;
                self.kind = OrderKind::Factory;
                self.items = e.items.clone();
                self.status = OrderStatus::Pending;
                self.total = e.total;
                self.stock_committed = false;
                self.created_at = e.occurred_at;
                self.created = true;
            }
            OrderEvent::OrderConfirmed(_) => {
                self.status = OrderStatus::Confirmed;
            }
            OrderEvent::OrderCompleted(e) => {
                self.status = OrderStatus::Completed;
                self.completed_at = Some(e.occurred_at);
            }
            OrderEvent::OrderCancelled(e) => {
                self.status = OrderStatus::Cancelled;
                if e.stock_released {
                    self.stock_committed = false;
                }
            }
            OrderEvent::OrderDelivered(e) => {
                self.status = OrderStatus::Delivered;
                self.delivered_at = Some(e.occurred_at);
            }
        }

        self.updated_at = event.occurred_at();
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OrderCommand::PlaceCustomerOrder(cmd) => self.handle_place_customer(cmd),
            OrderCommand::RequestFactoryOrder(cmd) => self.handle_request_factory(cmd),
            OrderCommand::ChangeOrderStatus(cmd) => self.handle_change_status(cmd),
        }
    }
}

impl Order {
    fn validate_items(items: &[OrderItem], allow_discount: bool) -> Result<u64, DomainError> {
        if items.is_empty() {
            return Err(DomainError::invalid_argument("order must contain at least one item"));
        }
        for item in items {
            if !item.is_consistent() {
                return Err(DomainError::invalid_argument(format!(
                    "inconsistent line for product {}",
                    item.product_id
                )));
            }
            if !allow_discount && item.discount_per_unit != 0 {
                return Err(DomainError::invalid_argument("factory orders cannot carry discounts"));
            }
        }
        order_total(items)
    }

    fn handle_place_customer(&self, cmd: &PlaceCustomerOrder) -> Result<Vec<OrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("order already exists"));
        }
        if cmd.customer_name.trim().is_empty() {
            return Err(DomainError::invalid_argument("customer name cannot be empty"));
        }
        if cmd.customer_phone.trim().is_empty() {
            return Err(DomainError::invalid_argument("customer phone cannot be empty"));
        }
        let total = Self::validate_items(&cmd.items, true)?;

        Ok(vec![OrderEvent::CustomerOrderPlaced(CustomerOrderPlaced {
            order_id: cmd.order_id,
            outlet_id: cmd.outlet_id,
            items: cmd.items.clone(),
            customer_name: cmd.customer_name.trim().to_string(),
            customer_phone: cmd.customer_phone.trim().to_string(),
            total,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_request_factory(&self, cmd: &RequestFactoryOrder) -> Result<Vec<OrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("order already exists"));
        }
        let total = Self::validate_items(&cmd.items, false)?;

        Ok(vec![OrderEvent::FactoryOrderRequested(FactoryOrderRequested {
            order_id: cmd.order_id,
            outlet_id: cmd.outlet_id,
            items: cmd.items.clone(),
            total,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_change_status(&self, cmd: &ChangeOrderStatus) -> Result<Vec<OrderEvent>, DomainError> {
        if !self.created || self.id != cmd.order_id {
            return Err(DomainError::not_found("order", cmd.order_id));
        }
        // A delivery is a one-time receipt of goods; asking for it twice is an error.
        if self.status == OrderStatus::Delivered && cmd.status == OrderStatus::Delivered {
            return Err(DomainError::invalid_transition(self.status, cmd.status));
        }
        if self.status == cmd.status {
            return Ok(Vec::new());
        }
        if !self.kind.allows(self.status, cmd.status) {
            return Err(DomainError::invalid_transition(self.status, cmd.status));
        }

        let (order_id, outlet_id, occurred_at) = (self.id, self.outlet_id, cmd.occurred_at);
        let event = match cmd.status {
            OrderStatus::Confirmed => OrderEvent::OrderConfirmed(OrderConfirmed {
                order_id,
                outlet_id,
                occurred_at,
            }),
            OrderStatus::Completed => OrderEvent::OrderCompleted(OrderCompleted {
                order_id,
                outlet_id,
                total: self.total,
                occurred_at,
            }),
            OrderStatus::Cancelled => OrderEvent::OrderCancelled(OrderCancelled {
                order_id,
                outlet_id,
                kind: self.kind,
                stock_released: self.stock_committed,
                occurred_at,
            }),
            OrderStatus::Delivered => OrderEvent::OrderDelivered(OrderDelivered {
                order_id,
                outlet_id,
                items: self.items.clone(),
                occurred_at,
            }),
            // No table entry leads into Pending.
            OrderStatus::Pending => return Err(DomainError::invalid_transition(self.status, cmd.status)),
        };
        Ok(vec![event])
    }
}
