use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use outletops_core::{Aggregate, AggregateRoot, DomainError, OutletId, ProductId, ReturnId, ValueObject};
use outletops_events::Event;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnItem {
    pub product_id: ProductId,
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ValueObject for ReturnItem {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnStatus {
    Pending,
    Approved,
    Rejected,
}

impl core::fmt::Display for ReturnStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            ReturnStatus::Pending => "pending",
            ReturnStatus::Approved => "approved",
            ReturnStatus::Rejected => "rejected",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnDecision {
    Approved,
    Rejected,
}

impl ReturnDecision {
    pub fn status(&self) -> ReturnStatus {
        match self {
            ReturnDecision::Approved => ReturnStatus::Approved,
            ReturnDecision::Rejected => ReturnStatus::Rejected,
        }
    }
}

/// Aggregate root: Return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Return {
    id: ReturnId,
    outlet_id: OutletId,
    items: Vec<ReturnItem>,
    reason: String,
    status: ReturnStatus,
    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    decided_at: Option<DateTime<Utc>>,
    version: u64,
    #[serde(skip)]
    created: bool,
}

impl Return {
    pub fn empty(id: ReturnId) -> Self {
        Self {
            id,
            outlet_id: OutletId::from_uuid(Default::default()),
            items: Vec::new(),
            reason: String::new(),
            status: ReturnStatus::Pending,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            decided_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> ReturnId {
        self.id
    }

    pub fn outlet_id(&self) -> OutletId {
        self.outlet_id
    }

    pub fn items(&self) -> &[ReturnItem] {
        &self.items
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn status(&self) -> ReturnStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn decided_at(&self) -> Option<DateTime<Utc>> {
        self.decided_at
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Ledger deltas that take the returned goods out of the outlet.
    pub fn debit_deltas(&self) -> Vec<(ProductId, i64)> {
        self.items.iter().map(|i| (i.product_id, -i.quantity)).collect()
    }
}

impl AggregateRoot for Return {
    type Id = ReturnId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestReturn {
    pub return_id: ReturnId,
    pub outlet_id: OutletId,
    pub items: Vec<ReturnItem>,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

/// Re-deciding with the same decision is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecideReturn {
    pub return_id: ReturnId,
    pub decision: ReturnDecision,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnCommand {
    RequestReturn(RequestReturn),
    DecideReturn(DecideReturn),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequested {
    pub return_id: ReturnId,
    pub outlet_id: OutletId,
    pub items: Vec<ReturnItem>,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnApproved {
    pub return_id: ReturnId,
    pub outlet_id: OutletId,
    pub items: Vec<ReturnItem>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRejected {
    pub return_id: ReturnId,
    pub outlet_id: OutletId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ReturnEvent {
    ReturnRequested(ReturnRequested),
    ReturnApproved(ReturnApproved),
    ReturnRejected(ReturnRejected),
}

impl Event for ReturnEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ReturnEvent::ReturnRequested(_) => "returns.return.requested",
            ReturnEvent::ReturnApproved(_) => "returns.return.approved",
            ReturnEvent::ReturnRejected(_) => "returns.return.rejected",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ReturnEvent::ReturnRequested(e) => e.occurred_at,
            ReturnEvent::ReturnApproved(e) => e.occurred_at,
            ReturnEvent::ReturnRejected(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Return {
    type Command = ReturnCommand;
    type Event = ReturnEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ReturnEvent::ReturnRequested(e) => {
                self.id = e.return_id;
                self.outlet_id = e.outlet_id;
                self.items = e.items.clone();
                self.reason = e.reason.clone();
                self.status = ReturnStatus::Pending;
                self.created_at = e.occurred_at;
                self.created = true;
            }
            ReturnEvent::ReturnApproved(e) => {
                self.status = ReturnStatus::Approved;
                self.decided_at = Some(e.occurred_at);
            }
            ReturnEvent::ReturnRejected(e) => {
                self.status = ReturnStatus::Rejected;
                self.decided_at = Some(e.occurred_at);
            }
        }
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ReturnCommand::RequestReturn(cmd) => self.handle_request(cmd),
            ReturnCommand::DecideReturn(cmd) => self.handle_decide(cmd),
        }
    }
}

impl Return {
    fn handle_request(&self, cmd: &RequestReturn) -> Result<Vec<ReturnEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("return already exists"));
        }
        if cmd.items.is_empty() {
            return Err(DomainError::invalid_argument("return must contain at least one item"));
        }
        if cmd.reason.trim().is_empty() {
            return Err(DomainError::invalid_argument("return reason cannot be empty"));
        }
        if let Some(bad) = cmd.items.iter().find(|i| i.quantity <= 0) {
            return Err(DomainError::invalid_argument(format!(
                "quantity for product {} must be positive",
                bad.product_id
            )));
        }

        Ok(vec![ReturnEvent::ReturnRequested(ReturnRequested {
            return_id: cmd.return_id,
            outlet_id: cmd.outlet_id,
            items: cmd.items.clone(),
            reason: cmd.reason.trim().to_string(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_decide(&self, cmd: &DecideReturn) -> Result<Vec<ReturnEvent>, DomainError> {
        if !self.created || self.id != cmd.return_id {
            return Err(DomainError::not_found("return", cmd.return_id));
        }

        let target = cmd.decision.status();
        if self.status == target {
            return Ok(Vec::new());
        }
        if self.status != ReturnStatus::Pending {
            return Err(DomainError::invalid_transition(self.status, target));
        }

        let event = match cmd.decision {
            ReturnDecision::Approved => ReturnEvent::ReturnApproved(ReturnApproved {
                return_id: self.id,
                outlet_id: self.outlet_id,
                items: self.items.clone(),
                occurred_at: cmd.occurred_at,
            }),
            ReturnDecision::Rejected => ReturnEvent::ReturnRejected(ReturnRejected {
                return_id: self.id,
                outlet_id: self.outlet_id,
                occurred_at: cmd.occurred_at,
            }),
        };
        Ok(vec![event])
    }
}
