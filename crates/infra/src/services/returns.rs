use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;

use outletops_auth::{Action, Actor, RoleGate};
use outletops_core::{
    AggregateRoot, DomainError, DomainResult, ExpectedVersion, OutletId, ReturnId, StockShortfall,
};
use outletops_events::{NotificationEmitter, execute};
use outletops_inventory::merge_deltas;
use outletops_returns::{
    DecideReturn, RequestReturn, Return, ReturnCommand, ReturnDecision, ReturnItem, ReturnStatus,
};

use super::catalog::CatalogService;
use super::emit_all;
use super::ledger::InventoryLedger;
use crate::repository::Repository;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReturn {
    pub outlet_id: OutletId,
    pub items: Vec<ReturnItem>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnFilter {
    pub outlet_id: Option<OutletId>,
    pub status: Option<ReturnStatus>,
}

impl ReturnFilter {
    fn matches(&self, ret: &Return) -> bool {
        self.outlet_id.is_none_or(|o| o == ret.outlet_id()) && self.status.is_none_or(|s| s == ret.status())
    }
}

/// Return requests and factory decisions on them.
pub struct ReturnService {
    returns: Arc<dyn Repository<Return>>,
    catalog: Arc<CatalogService>,
    ledger: Arc<InventoryLedger>,
    gate: RoleGate,
    emitter: Arc<dyn NotificationEmitter>,
}

impl ReturnService {
    pub fn new(
        returns: Arc<dyn Repository<Return>>,
        catalog: Arc<CatalogService>,
        ledger: Arc<InventoryLedger>,
        emitter: Arc<dyn NotificationEmitter>,
    ) -> Self {
        Self {
            returns,
            catalog,
            ledger,
            gate: RoleGate::new(),
            emitter,
        }
    }

    /// Record a pending return. Quantities (merged per product) must be held
    /// by the outlet right now; stock is untouched until approval.
    pub fn create_return(&self, actor: &Actor, new: NewReturn) -> DomainResult<Return> {
        let outlet_id = new.outlet_id;
        self.gate.check(actor, Action::RequestReturn, Some(outlet_id))?;
        self.catalog.get_outlet(outlet_id)?;

        let return_id = ReturnId::new();
        let mut ret = Return::empty(return_id);
        let events = execute(
            &mut ret,
            &ReturnCommand::RequestReturn(RequestReturn {
                return_id,
                outlet_id,
                items: new.items,
                reason: new.reason,
                occurred_at: Utc::now(),
            }),
        )?;

        let requested = merge_deltas(
            &ret.items()
                .iter()
                .map(|i| (i.product_id, i.quantity))
                .collect::<Vec<_>>(),
        )?;
        let mut shortfalls = Vec::new();
        for (product_id, quantity) in requested {
            self.catalog.get_product(product_id)?;
            let available = self.ledger.get_quantity(outlet_id, product_id)?;
            if quantity > available {
                shortfalls.push(StockShortfall {
                    product_id,
                    requested: quantity,
                    available,
                });
            }
        }
        if !shortfalls.is_empty() {
            tracing::warn!(outlet_id = %outlet_id, short = shortfalls.len(), "return exceeds held stock");
            return Err(DomainError::InsufficientStock(shortfalls));
        }

        self.returns.save(ret.clone(), ExpectedVersion::NoStream)?;

        tracing::info!(return_id = %return_id, outlet_id = %outlet_id, "return requested");
        emit_all(self.emitter.as_ref(), &events, "return", return_id, Some(outlet_id));
        Ok(ret)
    }

    /// Approve or reject a pending return.
    ///
    /// Approval debits the outlet through the ledger first, so a return whose
    /// goods are no longer held stays pending with `InsufficientStock`. A lost
    /// race on the status write credits the debit back.
    pub fn decide(&self, actor: &Actor, return_id: ReturnId, decision: ReturnDecision) -> DomainResult<Return> {
        let current = self.load(return_id)?;
        self.gate.check(actor, Action::DecideReturn, Some(current.outlet_id()))?;

        let expected = ExpectedVersion::Exact(current.version());
        let mut next = current;
        let events = execute(
            &mut next,
            &ReturnCommand::DecideReturn(DecideReturn {
                return_id,
                decision,
                occurred_at: Utc::now(),
            }),
        )
        .inspect_err(|e| tracing::warn!(return_id = %return_id, "return decision rejected: {e}"))?;

        if events.is_empty() {
            return Ok(next);
        }

        let approved = decision == ReturnDecision::Approved;
        if approved {
            self.ledger
                .apply_batch(next.outlet_id(), &next.debit_deltas())
                .inspect_err(|e| tracing::warn!(return_id = %return_id, "return approval rejected: {e}"))?;
        }

        if let Err(e) = self.returns.save(next.clone(), expected) {
            if approved {
                let credit: Vec<_> = next.debit_deltas().into_iter().map(|(p, d)| (p, -d)).collect();
                if let Err(ce) = self.ledger.apply_batch(next.outlet_id(), &credit) {
                    tracing::error!(return_id = %return_id, "return compensation failed: {ce}");
                }
            }
            return Err(e.into());
        }

        tracing::info!(return_id = %return_id, status = %next.status(), "return decided");
        emit_all(self.emitter.as_ref(), &events, "return", return_id, Some(next.outlet_id()));
        Ok(next)
    }

    pub fn get_return(&self, actor: &Actor, return_id: ReturnId) -> DomainResult<Return> {
        let ret = self.load(return_id)?;
        self.gate.check(actor, Action::ViewReturns, Some(ret.outlet_id()))?;
        Ok(ret)
    }

    pub fn list_returns(&self, actor: &Actor, filter: &ReturnFilter) -> DomainResult<Vec<Return>> {
        if let Some(outlet_id) = filter.outlet_id {
            self.gate.check(actor, Action::ViewReturns, Some(outlet_id))?;
        }

        let returns = self
            .returns
            .list()?
            .into_iter()
            .filter(|r| filter.matches(r))
            .filter(|r| self.gate.can_view(actor, Action::ViewReturns, r.outlet_id()))
            .collect();
        Ok(returns)
    }

    fn load(&self, return_id: ReturnId) -> DomainResult<Return> {
        self.returns
            .get(&return_id)?
            .ok_or_else(|| DomainError::not_found("return", return_id))
    }
}
