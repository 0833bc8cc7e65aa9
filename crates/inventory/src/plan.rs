use chrono::{DateTime, Utc};

use outletops_core::{DomainError, OutletId, ProductId, StockShortfall};

use crate::stock::{InventoryEvent, StockAdjusted, StockLow};

/// Outcome for one product of a planned batch.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StockChange {
    pub product_id: ProductId,
    pub previous: i64,
    pub delta: i64,
    pub new_quantity: i64,
}

impl StockChange {
    /// A debit that leaves the quantity at or below `threshold`.
    pub fn is_low(&self, threshold: i64) -> bool {
        self.delta < 0 && self.new_quantity <= threshold
    }

    /// Events describing this change once it is committed.
    pub fn events(&self, outlet_id: OutletId, threshold: i64, at: DateTime<Utc>) -> Vec<InventoryEvent> {
        let mut events = vec![InventoryEvent::StockAdjusted(StockAdjusted {
            outlet_id,
            product_id: self.product_id,
            delta: self.delta,
            new_quantity: self.new_quantity,
            occurred_at: at,
        })];
        if self.is_low(threshold) {
            events.push(InventoryEvent::StockLow(StockLow {
                outlet_id,
                product_id: self.product_id,
                quantity: self.new_quantity,
                threshold,
                occurred_at: at,
            }));
        }
        events
    }
}

/// Sum deltas per product, keeping first-seen order. Zero net deltas are kept
/// so the caller still validates the product.
pub fn merge_deltas(deltas: &[(ProductId, i64)]) -> Result<Vec<(ProductId, i64)>, DomainError> {
    let mut merged: Vec<(ProductId, i64)> = Vec::with_capacity(deltas.len());
    for (product_id, delta) in deltas {
        match merged.iter_mut().find(|(p, _)| p == product_id) {
            Some((_, total)) => {
                *total = total.checked_add(*delta).ok_or_else(|| {
                    DomainError::invalid_argument(format!("delta overflow for product {product_id}"))
                })?;
            }
            None => merged.push((*product_id, *delta)),
        }
    }
    Ok(merged)
}

/// Plan a batch against current quantities, all-or-nothing.
///
/// `current` returns the held quantity for a product (`0` when no entry).
/// Every product that would go negative is reported in one
/// `InsufficientStock` error; nothing is planned in that case.
pub fn plan_batch<F>(deltas: &[(ProductId, i64)], current: F) -> Result<Vec<StockChange>, DomainError>
where
    F: Fn(ProductId) -> i64,
{
    if deltas.is_empty() {
        return Err(DomainError::invalid_argument("stock batch cannot be empty"));
    }

    let merged = merge_deltas(deltas)?;
    let mut changes = Vec::with_capacity(merged.len());
    let mut shortfalls = Vec::new();

    for (product_id, delta) in merged {
        let previous = current(product_id);
        let new_quantity = previous.checked_add(delta).ok_or_else(|| {
            DomainError::invalid_argument(format!("stock overflow for product {product_id}"))
        })?;

        if new_quantity < 0 {
            shortfalls.push(StockShortfall {
                product_id,
                requested: -delta,
                available: previous,
            });
            continue;
        }

        changes.push(StockChange {
            product_id,
            previous,
            delta,
            new_quantity,
        });
    }

    if !shortfalls.is_empty() {
        return Err(DomainError::InsufficientStock(shortfalls));
    }
    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn levels(pairs: &[(ProductId, i64)]) -> HashMap<ProductId, i64> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn plans_debits_and_credits() {
        let a = ProductId::new();
        let b = ProductId::new();
        let stock = levels(&[(a, 10)]);

        let changes = plan_batch(&[(a, -4), (b, 7)], |p| stock.get(&p).copied().unwrap_or(0)).unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].new_quantity, 6);
        assert_eq!(changes[1].previous, 0);
        assert_eq!(changes[1].new_quantity, 7);
    }

    #[test]
    fn merges_duplicate_products_before_checking() {
        let a = ProductId::new();
        let stock = levels(&[(a, 5)]);

        // 3 + 3 exceeds 5 even though each line alone fits.
        let err = plan_batch(&[(a, -3), (a, -3)], |p| stock.get(&p).copied().unwrap_or(0)).unwrap_err();
        assert_eq!(
            err,
            DomainError::InsufficientStock(vec![StockShortfall {
                product_id: a,
                requested: 6,
                available: 5
            }])
        );
    }

    #[test]
    fn reports_every_short_product() {
        let a = ProductId::new();
        let b = ProductId::new();
        let c = ProductId::new();
        let stock = levels(&[(a, 1), (b, 1), (c, 9)]);

        let err = plan_batch(&[(a, -2), (c, -1), (b, -5)], |p| stock.get(&p).copied().unwrap_or(0))
            .unwrap_err();
        assert_eq!(err.conflicting_products(), vec![a, b]);
    }

    #[test]
    fn rejects_empty_batch_and_overflow() {
        assert!(matches!(plan_batch(&[], |_| 0), Err(DomainError::InvalidArgument(_))));

        let a = ProductId::new();
        let err = plan_batch(&[(a, 1)], |_| i64::MAX).unwrap_err();
        assert!(matches!(err, DomainError::InvalidArgument(_)));
        let err = merge_deltas(&[(a, i64::MAX), (a, 1)]).unwrap_err();
        assert!(matches!(err, DomainError::InvalidArgument(_)));
    }

    #[test]
    fn low_stock_only_on_debits() {
        let outlet = OutletId::new();
        let product = ProductId::new();
        let debit = StockChange {
            product_id: product,
            previous: 6,
            delta: -2,
            new_quantity: 4,
        };
        let credit = StockChange {
            product_id: product,
            previous: 1,
            delta: 2,
            new_quantity: 3,
        };

        assert!(debit.is_low(5));
        assert!(!credit.is_low(5));
        assert_eq!(debit.events(outlet, 5, Utc::now()).len(), 2);
        assert_eq!(credit.events(outlet, 5, Utc::now()).len(), 1);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            /// Property: a planned batch never leaves a quantity negative, and a
            /// rejected batch names exactly the products that would.
            #[test]
            fn planned_quantities_never_negative(
                start in prop::collection::vec(0i64..50, 4),
                lines in prop::collection::vec((0usize..4, -40i64..40), 1..10),
            ) {
                let products: Vec<ProductId> = (0..4).map(|_| ProductId::new()).collect();
                let stock: HashMap<ProductId, i64> = products.iter().copied().zip(start.iter().copied()).collect();
                let deltas: Vec<(ProductId, i64)> = lines.iter().map(|(i, d)| (products[*i], *d)).collect();

                let mut net: HashMap<ProductId, i64> = HashMap::new();
                for (p, d) in &deltas {
                    *net.entry(*p).or_default() += d;
                }
                let mut expected_short: Vec<ProductId> = net
                    .iter()
                    .filter(|(p, d)| stock[*p] + **d < 0)
                    .map(|(p, _)| *p)
                    .collect();
                expected_short.sort();

                match plan_batch(&deltas, |p| stock[&p]) {
                    Ok(changes) => {
                        prop_assert!(expected_short.is_empty());
                        for c in changes {
                            prop_assert!(c.new_quantity >= 0);
                            prop_assert_eq!(c.new_quantity, stock[&c.product_id] + net[&c.product_id]);
                        }
                    }
                    Err(err) => {
                        let mut short = err.conflicting_products();
                        short.sort();
                        prop_assert_eq!(short, expected_short);
                    }
                }
            }
        }
    }
}
