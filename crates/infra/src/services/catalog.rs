use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;

use outletops_auth::{Action, Actor, RoleGate};
use outletops_catalog::{
    ContactInfo, CreateProduct, MeasuringUnit, Outlet, OutletCommand, OutletStatus, Product,
    ProductCommand, RegisterOutlet, SetOutletStatus, SetProductStatus, UpdatePrice,
};
use outletops_core::{DomainError, DomainResult, OutletId, ProductId};
use outletops_events::NotificationEmitter;

use super::{create_and_save, emit_all, execute_and_save};
use crate::repository::Repository;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub unit_price: u64,
    pub measuring_unit: MeasuringUnit,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOutlet {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub contact: ContactInfo,
}

/// Products and outlets. Writes are owner-only (`manage_catalog`).
pub struct CatalogService {
    products: Arc<dyn Repository<Product>>,
    outlets: Arc<dyn Repository<Outlet>>,
    gate: RoleGate,
    emitter: Arc<dyn NotificationEmitter>,
}

impl CatalogService {
    pub fn new(
        products: Arc<dyn Repository<Product>>,
        outlets: Arc<dyn Repository<Outlet>>,
        emitter: Arc<dyn NotificationEmitter>,
    ) -> Self {
        Self {
            products,
            outlets,
            gate: RoleGate::new(),
            emitter,
        }
    }

    pub fn get_product(&self, id: ProductId) -> DomainResult<Product> {
        self.products
            .get(&id)?
            .ok_or_else(|| DomainError::not_found("product", id))
    }

    pub fn get_outlet(&self, id: OutletId) -> DomainResult<Outlet> {
        self.outlets
            .get(&id)?
            .ok_or_else(|| DomainError::not_found("outlet", id))
    }

    pub fn list_products(&self) -> DomainResult<Vec<Product>> {
        Ok(self.products.list()?)
    }

    pub fn list_outlets(&self) -> DomainResult<Vec<Outlet>> {
        Ok(self.outlets.list()?)
    }

    /// Product that exists and can be put on a new order.
    pub fn require_orderable(&self, id: ProductId) -> DomainResult<Product> {
        let product = self.get_product(id)?;
        if !product.is_active() {
            return Err(DomainError::invalid_argument(format!("product {id} is inactive")));
        }
        Ok(product)
    }

    pub fn require_open_outlet(&self, id: OutletId) -> DomainResult<Outlet> {
        let outlet = self.get_outlet(id)?;
        if !outlet.is_open() {
            return Err(DomainError::invalid_argument(format!("outlet {id} is closed")));
        }
        Ok(outlet)
    }

    pub fn create_product(&self, actor: &Actor, new: NewProduct) -> DomainResult<Product> {
        self.gate.check(actor, Action::ManageCatalog, None)?;

        let id = ProductId::new();
        let cmd = ProductCommand::CreateProduct(CreateProduct {
            product_id: id,
            name: new.name,
            category: new.category,
            unit_price: new.unit_price,
            measuring_unit: new.measuring_unit,
            occurred_at: Utc::now(),
        });
        let (product, events) = create_and_save(self.products.as_ref(), Product::empty(id), &cmd)?;

        tracing::info!(product_id = %id, actor = %actor.principal_id(), "product created");
        emit_all(self.emitter.as_ref(), &events, "product", id, None);
        Ok(product)
    }

    /// Idempotent: no version bump when the flag is unchanged.
    pub fn set_product_status(&self, actor: &Actor, id: ProductId, active: bool) -> DomainResult<Product> {
        self.gate.check(actor, Action::ManageCatalog, None)?;

        let cmd = ProductCommand::SetProductStatus(SetProductStatus {
            product_id: id,
            active,
            occurred_at: Utc::now(),
        });
        let (product, events) = execute_and_save(self.products.as_ref(), "product", &id, &cmd)?;

        if !events.is_empty() {
            tracing::info!(product_id = %id, active, "product status changed");
        }
        emit_all(self.emitter.as_ref(), &events, "product", id, None);
        Ok(product)
    }

    pub fn update_price(&self, actor: &Actor, id: ProductId, new_price: u64) -> DomainResult<Product> {
        self.gate.check(actor, Action::ManageCatalog, None)?;

        let cmd = ProductCommand::UpdatePrice(UpdatePrice {
            product_id: id,
            new_price,
            occurred_at: Utc::now(),
        });
        let (product, events) = execute_and_save(self.products.as_ref(), "product", &id, &cmd)
            .inspect_err(|e| tracing::warn!(product_id = %id, "price update rejected: {e}"))?;

        tracing::info!(product_id = %id, new_price, "product price updated");
        emit_all(self.emitter.as_ref(), &events, "product", id, None);
        Ok(product)
    }

    pub fn register_outlet(&self, actor: &Actor, new: NewOutlet) -> DomainResult<Outlet> {
        self.gate.check(actor, Action::ManageCatalog, None)?;

        let id = OutletId::new();
        let cmd = OutletCommand::RegisterOutlet(RegisterOutlet {
            outlet_id: id,
            name: new.name,
            address: new.address,
            contact: new.contact,
            occurred_at: Utc::now(),
        });
        let (outlet, events) = create_and_save(self.outlets.as_ref(), Outlet::empty(id), &cmd)?;

        tracing::info!(outlet_id = %id, "outlet registered");
        emit_all(self.emitter.as_ref(), &events, "outlet", id, Some(id));
        Ok(outlet)
    }

    pub fn set_outlet_status(&self, actor: &Actor, id: OutletId, status: OutletStatus) -> DomainResult<Outlet> {
        self.gate.check(actor, Action::ManageCatalog, Some(id))?;

        let cmd = OutletCommand::SetOutletStatus(SetOutletStatus {
            outlet_id: id,
            status,
            occurred_at: Utc::now(),
        });
        let (outlet, events) = execute_and_save(self.outlets.as_ref(), "outlet", &id, &cmd)?;

        if !events.is_empty() {
            tracing::info!(outlet_id = %id, %status, "outlet status changed");
        }
        emit_all(self.emitter.as_ref(), &events, "outlet", id, Some(id));
        Ok(outlet)
    }
}
