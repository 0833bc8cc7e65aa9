//! Inventory domain module: stock entries and batch arithmetic.
//!
//! Pure logic only. The ledger service owns the stock map and the lock; this
//! crate decides whether a batch of signed deltas may be committed and what
//! every touched quantity becomes.

pub mod plan;
pub mod stock;

pub use plan::{StockChange, merge_deltas, plan_batch};
pub use stock::{InventoryEvent, StockAdjusted, StockEntry, StockKey, StockLow};
