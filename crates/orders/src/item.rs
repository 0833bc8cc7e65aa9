use serde::{Deserialize, Serialize};

use outletops_core::{DomainError, DomainResult, ProductId, ValueObject};

/// A requested line before prices are snapshotted from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineInput {
    pub product_id: ProductId,
    pub quantity: i64,
    #[serde(default)]
    pub discount_per_unit: u64,
}

/// Order line with the unit price snapshotted at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: i64,
    /// Price in smallest currency unit.
    pub unit_price: u64,
    pub discount_per_unit: u64,
    pub line_total: u64,
}

impl ValueObject for OrderItem {}

impl OrderItem {
    /// Build a priced line: `(unit_price - discount) * quantity`.
    pub fn priced(
        product_id: ProductId,
        quantity: i64,
        unit_price: u64,
        discount_per_unit: u64,
    ) -> DomainResult<Self> {
        if quantity <= 0 {
            return Err(DomainError::invalid_argument(format!(
                "quantity for product {product_id} must be positive"
            )));
        }
        if discount_per_unit > unit_price {
            return Err(DomainError::invalid_argument(format!(
                "discount for product {product_id} exceeds unit price"
            )));
        }

        let line_total = (unit_price - discount_per_unit)
            .checked_mul(quantity as u64)
            .ok_or_else(|| DomainError::invalid_argument(format!("line total overflow for product {product_id}")))?;

        Ok(Self {
            product_id,
            quantity,
            unit_price,
            discount_per_unit,
            line_total,
        })
    }

    /// Whether the stored line total matches its own price arithmetic.
    pub fn is_consistent(&self) -> bool {
        Self::priced(self.product_id, self.quantity, self.unit_price, self.discount_per_unit)
            .is_ok_and(|recomputed| recomputed.line_total == self.line_total)
    }
}

/// Sum of line totals, checked.
pub fn order_total(items: &[OrderItem]) -> DomainResult<u64> {
    items.iter().try_fold(0u64, |acc, item| {
        acc.checked_add(item.line_total)
            .ok_or_else(|| DomainError::invalid_argument("order total overflow"))
    })
}
