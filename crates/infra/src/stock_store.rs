use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use outletops_core::{DomainError, DomainResult, OutletId, ProductId};
use outletops_inventory::{StockChange, StockEntry, StockKey, plan_batch};

/// Atomic multi-key stock storage.
///
/// `commit_batch` plans and writes a whole batch in one critical section:
/// concurrent readers see either every change of a batch or none of them.
pub trait StockStore: Send + Sync {
    /// Held quantity, `0` when no entry exists.
    fn quantity(&self, key: StockKey) -> DomainResult<i64>;

    fn entry(&self, key: StockKey) -> DomainResult<Option<StockEntry>>;

    fn entries_for_outlet(&self, outlet_id: OutletId) -> DomainResult<Vec<StockEntry>>;

    fn commit_batch(
        &self,
        outlet_id: OutletId,
        deltas: &[(ProductId, i64)],
        at: DateTime<Utc>,
    ) -> DomainResult<Vec<StockChange>>;
}

impl<S> StockStore for Arc<S>
where
    S: StockStore + ?Sized,
{
    fn quantity(&self, key: StockKey) -> DomainResult<i64> {
        (**self).quantity(key)
    }

    fn entry(&self, key: StockKey) -> DomainResult<Option<StockEntry>> {
        (**self).entry(key)
    }

    fn entries_for_outlet(&self, outlet_id: OutletId) -> DomainResult<Vec<StockEntry>> {
        (**self).entries_for_outlet(outlet_id)
    }

    fn commit_batch(
        &self,
        outlet_id: OutletId,
        deltas: &[(ProductId, i64)],
        at: DateTime<Utc>,
    ) -> DomainResult<Vec<StockChange>> {
        (**self).commit_batch(outlet_id, deltas, at)
    }
}

/// In-memory stock map behind a single `RwLock`.
#[derive(Debug, Default)]
pub struct InMemoryStockStore {
    entries: RwLock<HashMap<StockKey, StockEntry>>,
}

impl InMemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> DomainError {
    DomainError::unavailable("stock lock poisoned")
}

impl StockStore for InMemoryStockStore {
    fn quantity(&self, key: StockKey) -> DomainResult<i64> {
        let map = self.entries.read().map_err(|_| poisoned())?;
        Ok(map.get(&key).map(|e| e.quantity).unwrap_or(0))
    }

    fn entry(&self, key: StockKey) -> DomainResult<Option<StockEntry>> {
        let map = self.entries.read().map_err(|_| poisoned())?;
        Ok(map.get(&key).copied())
    }

    fn entries_for_outlet(&self, outlet_id: OutletId) -> DomainResult<Vec<StockEntry>> {
        let map = self.entries.read().map_err(|_| poisoned())?;
        let mut entries: Vec<StockEntry> = map
            .values()
            .filter(|e| e.outlet_id == outlet_id)
            .copied()
            .collect();
        entries.sort_by_key(|e| e.product_id);
        Ok(entries)
    }

    fn commit_batch(
        &self,
        outlet_id: OutletId,
        deltas: &[(ProductId, i64)],
        at: DateTime<Utc>,
    ) -> DomainResult<Vec<StockChange>> {
        let mut map = self.entries.write().map_err(|_| poisoned())?;

        let changes = plan_batch(deltas, |product_id| {
            map.get(&StockKey::new(outlet_id, product_id))
                .map(|e| e.quantity)
                .unwrap_or(0)
        })?;

        for change in &changes {
            map.insert(
                StockKey::new(outlet_id, change.product_id),
                StockEntry {
                    outlet_id,
                    product_id: change.product_id,
                    quantity: change.new_quantity,
                    updated_at: at,
                },
            );
        }

        Ok(changes)
    }
}
