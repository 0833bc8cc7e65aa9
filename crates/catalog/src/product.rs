use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use outletops_core::{Aggregate, AggregateRoot, DomainError, ProductId, ValueObject};
use outletops_events::Event;

/// Unit a product is sold and stocked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasuringUnit {
    Piece,
    Kilogram,
    Gram,
    Litre,
    Metre,
    Pack,
    Dozen,
}

/// A superseded price and the window it was in force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceChange {
    pub price: u64,
    pub effective_from: DateTime<Utc>,
    pub superseded_at: DateTime<Utc>,
}

impl ValueObject for PriceChange {}

/// Aggregate root: Product.
///
/// Prices are in the smallest currency unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    id: ProductId,
    name: String,
    category: String,
    unit_price: u64,
    measuring_unit: MeasuringUnit,
    active: bool,
    price_effective_from: DateTime<Utc>,
    price_history: Vec<PriceChange>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
    #[serde(skip)]
    created: bool,
}

impl Product {
    /// Create an empty, not-yet-created aggregate instance.
    pub fn empty(id: ProductId) -> Self {
        Self {
            id,
            name: String::new(),
            category: String::new(),
            unit_price: 0,
            measuring_unit: MeasuringUnit::Piece,
            active: false,
            price_effective_from: DateTime::<Utc>::UNIX_EPOCH,
            price_history: Vec::new(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn unit_price(&self) -> u64 {
        self.unit_price
    }

    pub fn measuring_unit(&self) -> MeasuringUnit {
        self.measuring_unit
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn price_history(&self) -> &[PriceChange] {
        &self.price_history
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Price in force at `at`, or `None` before the product existed.
    pub fn price_at(&self, at: DateTime<Utc>) -> Option<u64> {
        if !self.created || at < self.created_at {
            return None;
        }
        if at >= self.price_effective_from {
            return Some(self.unit_price);
        }
        self.price_history
            .iter()
            .find(|c| c.effective_from <= at && at < c.superseded_at)
            .map(|c| c.price)
    }
}

impl AggregateRoot for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateProduct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProduct {
    pub product_id: ProductId,
    pub name: String,
    pub category: String,
    pub unit_price: u64,
    pub measuring_unit: MeasuringUnit,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetProductStatus (idempotent).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetProductStatus {
    pub product_id: ProductId,
    pub active: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdatePrice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePrice {
    pub product_id: ProductId,
    pub new_price: u64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductCommand {
    CreateProduct(CreateProduct),
    SetProductStatus(SetProductStatus),
    UpdatePrice(UpdatePrice),
}

/// Event: ProductCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCreated {
    pub product_id: ProductId,
    pub name: String,
    pub category: String,
    pub unit_price: u64,
    pub measuring_unit: MeasuringUnit,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductActivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductActivated {
    pub product_id: ProductId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductDeactivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDeactivated {
    pub product_id: ProductId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PriceUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceUpdated {
    pub product_id: ProductId,
    pub previous_price: u64,
    pub new_price: u64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ProductEvent {
    ProductCreated(ProductCreated),
    ProductActivated(ProductActivated),
    ProductDeactivated(ProductDeactivated),
    PriceUpdated(PriceUpdated),
}

impl Event for ProductEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ProductEvent::ProductCreated(_) => "catalog.product.created",
            ProductEvent::ProductActivated(_) => "catalog.product.activated",
            ProductEvent::ProductDeactivated(_) => "catalog.product.deactivated",
            ProductEvent::PriceUpdated(_) => "catalog.product.price_updated",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ProductEvent::ProductCreated(e) => e.occurred_at,
            ProductEvent::ProductActivated(e) => e.occurred_at,
            ProductEvent::ProductDeactivated(e) => e.occurred_at,
            ProductEvent::PriceUpdated(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Product {
    type Command = ProductCommand;
    type Event = ProductEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ProductEvent::ProductCreated(e) => {
                self.id = e.product_id;
                self.name = e.name.clone();
                self.category = e.category.clone();
                self.unit_price = e.unit_price;
                self.measuring_unit = e.measuring_unit;
                self.active = true;
                self.price_effective_from = e.occurred_at;
                self.created_at = e.occurred_at;
                self.updated_at = e.occurred_at;
                self.created = true;
            }
            ProductEvent::ProductActivated(e) => {
                self.active = true;
                self.updated_at = e.occurred_at;
            }
            ProductEvent::ProductDeactivated(e) => {
                self.active = false;
                self.updated_at = e.occurred_at;
            }
            ProductEvent::PriceUpdated(e) => {
                self.price_history.push(PriceChange {
                    price: e.previous_price,
                    effective_from: self.price_effective_from,
                    superseded_at: e.occurred_at,
                });
                self.unit_price = e.new_price;
                self.price_effective_from = e.occurred_at;
                self.updated_at = e.occurred_at;
            }
        }

        // +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ProductCommand::CreateProduct(cmd) => self.handle_create(cmd),
            ProductCommand::SetProductStatus(cmd) => self.handle_set_status(cmd),
            ProductCommand::UpdatePrice(cmd) => self.handle_update_price(cmd),
        }
    }
}

impl Product {
    fn ensure_exists(&self, product_id: ProductId) -> Result<(), DomainError> {
        if !self.created || self.id != product_id {
            return Err(DomainError::not_found("product", product_id));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateProduct) -> Result<Vec<ProductEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("product already exists"));
        }
        if cmd.name.trim().is_empty() {
            return Err(DomainError::invalid_argument("product name cannot be empty"));
        }
        if cmd.category.trim().is_empty() {
            return Err(DomainError::invalid_argument("product category cannot be empty"));
        }
        if cmd.unit_price == 0 {
            return Err(DomainError::invalid_argument("unit price must be positive"));
        }

        Ok(vec![ProductEvent::ProductCreated(ProductCreated {
            product_id: cmd.product_id,
            name: cmd.name.trim().to_string(),
            category: cmd.category.trim().to_string(),
            unit_price: cmd.unit_price,
            measuring_unit: cmd.measuring_unit,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_status(&self, cmd: &SetProductStatus) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_exists(cmd.product_id)?;

        if self.active == cmd.active {
            return Ok(Vec::new());
        }

        let event = if cmd.active {
            ProductEvent::ProductActivated(ProductActivated {
                product_id: cmd.product_id,
                occurred_at: cmd.occurred_at,
            })
        } else {
            ProductEvent::ProductDeactivated(ProductDeactivated {
                product_id: cmd.product_id,
                occurred_at: cmd.occurred_at,
            })
        };
        Ok(vec![event])
    }

    fn handle_update_price(&self, cmd: &UpdatePrice) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_exists(cmd.product_id)?;

        if cmd.new_price == 0 {
            return Err(DomainError::invalid_argument("price must be positive"));
        }
        // Price history stays ordered even if the clock steps backwards.
        let effective_at = cmd.occurred_at.max(self.price_effective_from);

        Ok(vec![ProductEvent::PriceUpdated(PriceUpdated {
            product_id: cmd.product_id,
            previous_price: self.unit_price,
            new_price: cmd.new_price,
            occurred_at: effective_at,
        })])
    }
}
