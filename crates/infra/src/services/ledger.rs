use std::sync::Arc;

use chrono::Utc;

use outletops_auth::{Action, Actor, RoleGate};
use outletops_core::{DomainError, DomainResult, OutletId, ProductId};
use outletops_events::{Notification, NotificationEmitter};
use outletops_inventory::{StockChange, StockEntry, StockKey};

use super::catalog::CatalogService;
use crate::stock_store::StockStore;

/// Per-outlet stock quantities. Every stock mutation in the system goes
/// through [`InventoryLedger::apply_batch`].
pub struct InventoryLedger {
    store: Arc<dyn StockStore>,
    catalog: Arc<CatalogService>,
    gate: RoleGate,
    emitter: Arc<dyn NotificationEmitter>,
    low_stock_threshold: i64,
}

impl InventoryLedger {
    pub fn new(
        store: Arc<dyn StockStore>,
        catalog: Arc<CatalogService>,
        emitter: Arc<dyn NotificationEmitter>,
        low_stock_threshold: i64,
    ) -> Self {
        Self {
            store,
            catalog,
            gate: RoleGate::new(),
            emitter,
            low_stock_threshold,
        }
    }

    pub fn low_stock_threshold(&self) -> i64 {
        self.low_stock_threshold
    }

    /// Held quantity, `0` when the outlet never held the product.
    pub fn get_quantity(&self, outlet_id: OutletId, product_id: ProductId) -> DomainResult<i64> {
        self.store.quantity(StockKey::new(outlet_id, product_id))
    }

    pub fn apply_delta(&self, outlet_id: OutletId, product_id: ProductId, delta: i64) -> DomainResult<i64> {
        let changes = self.apply_batch(outlet_id, &[(product_id, delta)])?;
        changes
            .first()
            .map(|c| c.new_quantity)
            .ok_or_else(|| DomainError::unavailable("stock batch produced no change"))
    }

    /// Apply signed deltas all-or-nothing. Duplicate products are merged
    /// before the non-negativity check.
    pub fn apply_batch(&self, outlet_id: OutletId, deltas: &[(ProductId, i64)]) -> DomainResult<Vec<StockChange>> {
        self.catalog.get_outlet(outlet_id)?;
        for (product_id, _) in deltas {
            self.catalog.get_product(*product_id)?;
        }

        let at = Utc::now();
        let changes = self
            .store
            .commit_batch(outlet_id, deltas, at)
            .inspect_err(|e| tracing::warn!(outlet_id = %outlet_id, "stock batch rejected: {e}"))?;

        tracing::info!(outlet_id = %outlet_id, products = changes.len(), "stock batch committed");
        for change in &changes {
            for event in change.events(outlet_id, self.low_stock_threshold, at) {
                let key = event.key();
                self.emitter.emit(Notification::from_event(
                    &event,
                    "stock",
                    format!("{}:{}", key.outlet_id, key.product_id),
                    Some(outlet_id),
                ));
            }
        }
        Ok(changes)
    }

    pub fn outlet_stock(&self, actor: &Actor, outlet_id: OutletId) -> DomainResult<Vec<StockEntry>> {
        self.gate.check(actor, Action::ViewStock, Some(outlet_id))?;
        self.catalog.get_outlet(outlet_id)?;

        tracing::debug!(outlet_id = %outlet_id, "reading outlet stock");
        self.store.entries_for_outlet(outlet_id)
    }

    /// Manual correction or restock outside the order flow.
    pub fn adjust(
        &self,
        actor: &Actor,
        outlet_id: OutletId,
        product_id: ProductId,
        delta: i64,
    ) -> DomainResult<StockEntry> {
        self.gate.check(actor, Action::AdjustStock, Some(outlet_id))?;
        if delta == 0 {
            return Err(DomainError::invalid_argument("delta cannot be zero"));
        }

        self.apply_batch(outlet_id, &[(product_id, delta)])?;
        self.store
            .entry(StockKey::new(outlet_id, product_id))?
            .ok_or_else(|| DomainError::unavailable("stock entry missing after commit"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{NewOutlet, NewProduct, ServiceRegistry};
    use outletops_auth::PrincipalId;
    use outletops_catalog::MeasuringUnit;
    use outletops_events::RecordingEmitter;

    struct Fixture {
        services: ServiceRegistry,
        emitter: Arc<RecordingEmitter>,
        owner: Actor,
        outlet: OutletId,
        product: ProductId,
    }

    fn fixture() -> Fixture {
        let emitter = Arc::new(RecordingEmitter::new());
        let services = ServiceRegistry::in_memory(emitter.clone(), 2);
        let owner = Actor::owner(PrincipalId::new());
        let outlet = services
            .catalog
            .register_outlet(
                &owner,
                NewOutlet {
                    name: "Galle".to_string(),
                    address: "Fort".to_string(),
                    contact: Default::default(),
                },
            )
            .unwrap()
            .id_typed();
        let product = services
            .catalog
            .create_product(
                &owner,
                NewProduct {
                    name: "Soap".to_string(),
                    category: "household".to_string(),
                    unit_price: 120,
                    measuring_unit: MeasuringUnit::Piece,
                },
            )
            .unwrap()
            .id_typed();
        Fixture {
            services,
            emitter,
            owner,
            outlet,
            product,
        }
    }

    #[test]
    fn missing_entry_reads_zero() {
        let f = fixture();
        assert_eq!(f.services.ledger.get_quantity(f.outlet, f.product).unwrap(), 0);
    }

    #[test]
    fn apply_delta_rejects_going_negative() {
        let f = fixture();
        let ledger = &f.services.ledger;
        assert_eq!(ledger.apply_delta(f.outlet, f.product, 3).unwrap(), 3);

        let err = ledger.apply_delta(f.outlet, f.product, -4).unwrap_err();
        assert!(matches!(err, DomainError::InsufficientStock(_)));
        assert_eq!(ledger.get_quantity(f.outlet, f.product).unwrap(), 3);
    }

    #[test]
    fn unknown_outlet_or_product_is_not_found() {
        let f = fixture();
        let ledger = &f.services.ledger;
        assert!(matches!(
            ledger.apply_batch(OutletId::new(), &[(f.product, 1)]),
            Err(DomainError::NotFound { entity: "outlet", .. })
        ));
        assert!(matches!(
            ledger.apply_batch(f.outlet, &[(f.product, 1), (ProductId::new(), 1)]),
            Err(DomainError::NotFound { entity: "product", .. })
        ));
        assert_eq!(ledger.get_quantity(f.outlet, f.product).unwrap(), 0);
    }

    #[test]
    fn debit_to_threshold_emits_low_stock() {
        let f = fixture();
        let ledger = &f.services.ledger;
        ledger.apply_delta(f.outlet, f.product, 5).unwrap();
        ledger.apply_delta(f.outlet, f.product, -3).unwrap();

        let types = f.emitter.event_types();
        assert_eq!(types.iter().filter(|t| *t == "inventory.stock.adjusted").count(), 2);
        assert_eq!(types.iter().filter(|t| *t == "inventory.stock.low").count(), 1);
    }

    #[test]
    fn adjust_is_owner_only_and_rejects_zero() {
        let f = fixture();
        let ledger = &f.services.ledger;
        let staff = Actor::outlet_staff(PrincipalId::new(), f.outlet);

        assert!(matches!(
            ledger.adjust(&staff, f.outlet, f.product, 4),
            Err(DomainError::Unauthorized(_))
        ));
        assert!(matches!(
            ledger.adjust(&f.owner, f.outlet, f.product, 0),
            Err(DomainError::InvalidArgument(_))
        ));

        let entry = ledger.adjust(&f.owner, f.outlet, f.product, 4).unwrap();
        assert_eq!(entry.quantity, 4);
        assert_eq!(ledger.outlet_stock(&staff, f.outlet).unwrap(), vec![entry]);
    }

    #[test]
    fn staff_cannot_read_other_outlet_stock() {
        let f = fixture();
        let staff = Actor::outlet_staff(PrincipalId::new(), OutletId::new());
        assert!(matches!(
            f.services.ledger.outlet_stock(&staff, f.outlet),
            Err(DomainError::Unauthorized(_))
        ));
    }
}
