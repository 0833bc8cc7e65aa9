//! Orders domain module: customer sales and factory restock orders.
//!
//! One aggregate covers both kinds; the kind selects the transition table.
//! Stock is never touched here; the order service drives the ledger around
//! the aggregate's decisions.

pub mod item;
pub mod order;
pub mod status;

pub use item::{OrderItem, OrderLineInput, order_total};
pub use order::{
    ChangeOrderStatus, CustomerOrderPlaced, FactoryOrderRequested, Order, OrderCancelled,
    OrderCommand, OrderCompleted, OrderConfirmed, OrderDelivered, OrderEvent, PlaceCustomerOrder,
    RequestFactoryOrder,
};
pub use status::{OrderKind, OrderStatus};
