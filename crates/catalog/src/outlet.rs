use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use outletops_core::{Aggregate, AggregateRoot, DomainError, OutletId, ValueObject};
use outletops_events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutletStatus {
    Open,
    Closed,
}

impl core::fmt::Display for OutletStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            OutletStatus::Open => "open",
            OutletStatus::Closed => "closed",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl ValueObject for ContactInfo {}

/// Aggregate root: Outlet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Outlet {
    id: OutletId,
    name: String,
    address: String,
    contact: ContactInfo,
    status: OutletStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
    #[serde(skip)]
    created: bool,
}

impl Outlet {
    pub fn empty(id: OutletId) -> Self {
        Self {
            id,
            name: String::new(),
            address: String::new(),
            contact: ContactInfo::default(),
            status: OutletStatus::Closed,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> OutletId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn contact(&self) -> &ContactInfo {
        &self.contact
    }

    pub fn status(&self) -> OutletStatus {
        self.status
    }

    pub fn is_open(&self) -> bool {
        self.status == OutletStatus::Open
    }

    pub fn is_created(&self) -> bool {
        self.created
    }
}

impl AggregateRoot for Outlet {
    type Id = OutletId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterOutlet {
    pub outlet_id: OutletId,
    pub name: String,
    pub address: String,
    pub contact: ContactInfo,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetOutletStatus {
    pub outlet_id: OutletId,
    pub status: OutletStatus,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutletCommand {
    RegisterOutlet(RegisterOutlet),
    SetOutletStatus(SetOutletStatus),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutletRegistered {
    pub outlet_id: OutletId,
    pub name: String,
    pub address: String,
    pub contact: ContactInfo,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutletOpened {
    pub outlet_id: OutletId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutletClosed {
    pub outlet_id: OutletId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OutletEvent {
    OutletRegistered(OutletRegistered),
    OutletOpened(OutletOpened),
    OutletClosed(OutletClosed),
}

impl Event for OutletEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OutletEvent::OutletRegistered(_) => "catalog.outlet.registered",
            OutletEvent::OutletOpened(_) => "catalog.outlet.opened",
            OutletEvent::OutletClosed(_) => "catalog.outlet.closed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OutletEvent::OutletRegistered(e) => e.occurred_at,
            OutletEvent::OutletOpened(e) => e.occurred_at,
            OutletEvent::OutletClosed(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Outlet {
    type Command = OutletCommand;
    type Event = OutletEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            OutletEvent::OutletRegistered(e) => {
                self.id = e.outlet_id;
                self.name = e.name.clone();
                self.address = e.address.clone();
                self.contact = e.contact.clone();
                self.status = OutletStatus::Open;
                self.created_at = e.occurred_at;
                self.updated_at = e.occurred_at;
                self.created = true;
            }
            OutletEvent::OutletOpened(e) => {
                self.status = OutletStatus::Open;
                self.updated_at = e.occurred_at;
            }
            OutletEvent::OutletClosed(e) => {
                self.status = OutletStatus::Closed;
                self.updated_at = e.occurred_at;
            }
        }
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OutletCommand::RegisterOutlet(cmd) => {
                if self.created {
                    return Err(DomainError::conflict("outlet already exists"));
                }
                if cmd.name.trim().is_empty() {
                    return Err(DomainError::invalid_argument("outlet name cannot be empty"));
                }
                if cmd.address.trim().is_empty() {
                    return Err(DomainError::invalid_argument("outlet address cannot be empty"));
                }
                Ok(vec![OutletEvent::OutletRegistered(OutletRegistered {
                    outlet_id: cmd.outlet_id,
                    name: cmd.name.trim().to_string(),
                    address: cmd.address.trim().to_string(),
                    contact: cmd.contact.clone(),
                    occurred_at: cmd.occurred_at,
                })])
            }
            OutletCommand::SetOutletStatus(cmd) => {
                if !self.created || self.id != cmd.outlet_id {
                    return Err(DomainError::not_found("outlet", cmd.outlet_id));
                }
                if self.status == cmd.status {
                    return Ok(Vec::new());
                }
                let event = match cmd.status {
                    OutletStatus::Open => OutletEvent::OutletOpened(OutletOpened {
                        outlet_id: cmd.outlet_id,
                        occurred_at: cmd.occurred_at,
                    }),
                    OutletStatus::Closed => OutletEvent::OutletClosed(OutletClosed {
                        outlet_id: cmd.outlet_id,
                        occurred_at: cmd.occurred_at,
                    }),
                };
                Ok(vec![event])
            }
        }
    }
}
