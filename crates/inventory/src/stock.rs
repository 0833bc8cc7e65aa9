use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use outletops_core::{Entity, OutletId, ProductId};
use outletops_events::Event;

/// Key of one stock entry: a product held at an outlet.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockKey {
    pub outlet_id: OutletId,
    pub product_id: ProductId,
}

impl StockKey {
    pub fn new(outlet_id: OutletId, product_id: ProductId) -> Self {
        Self {
            outlet_id,
            product_id,
        }
    }
}

/// Quantity of a product held at an outlet. Never negative.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockEntry {
    pub outlet_id: OutletId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub updated_at: DateTime<Utc>,
}

impl StockEntry {
    pub fn key(&self) -> StockKey {
        StockKey::new(self.outlet_id, self.product_id)
    }
}

impl Entity for StockEntry {
    type Id = StockKey;

    fn id(&self) -> Self::Id {
        self.key()
    }
}

/// Event: StockAdjusted (one per product touched by a committed batch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjusted {
    pub outlet_id: OutletId,
    pub product_id: ProductId,
    pub delta: i64,
    pub new_quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockLow (a debit left the quantity at or below the threshold).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLow {
    pub outlet_id: OutletId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub threshold: i64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum InventoryEvent {
    StockAdjusted(StockAdjusted),
    StockLow(StockLow),
}

impl InventoryEvent {
    pub fn outlet_id(&self) -> OutletId {
        match self {
            InventoryEvent::StockAdjusted(e) => e.outlet_id,
            InventoryEvent::StockLow(e) => e.outlet_id,
        }
    }

    pub fn key(&self) -> StockKey {
        match self {
            InventoryEvent::StockAdjusted(e) => StockKey::new(e.outlet_id, e.product_id),
            InventoryEvent::StockLow(e) => StockKey::new(e.outlet_id, e.product_id),
        }
    }
}

impl Event for InventoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InventoryEvent::StockAdjusted(_) => "inventory.stock.adjusted",
            InventoryEvent::StockLow(_) => "inventory.stock.low",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InventoryEvent::StockAdjusted(e) => e.occurred_at,
            InventoryEvent::StockLow(e) => e.occurred_at,
        }
    }
}
