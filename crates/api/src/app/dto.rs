//! Request bodies that are not already service inputs.
//!
//! Creation bodies deserialize straight into the service structs
//! (`NewCustomerOrder`, `NewReturn`, ...); the DTOs here carry the
//! optional `actorRole` assertion or a single field.

use serde::{Deserialize, Serialize};

use outletops_auth::{Action, Role};
use outletops_catalog::OutletStatus;
use outletops_core::OutletId;
use outletops_orders::OrderStatus;
use outletops_returns::ReturnDecision;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetOrderStatusRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub actor_role: Option<Role>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecideReturnRequest {
    pub decision: ReturnDecision,
    #[serde(default)]
    pub actor_role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePriceRequest {
    pub price: u64,
}

#[derive(Debug, Deserialize)]
pub struct SetProductStatusRequest {
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct SetOutletStatusRequest {
    pub status: OutletStatus,
}

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub delta: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhoAmIResponse {
    pub principal_id: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outlet_id: Option<OutletId>,
    pub permitted_actions: Vec<Action>,
}
