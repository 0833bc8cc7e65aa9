//! Domain error model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::id::ProductId;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// One product that could not be covered by the stock an outlet holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockShortfall {
    pub product_id: ProductId,
    pub requested: i64,
    pub available: i64,
}

impl core::fmt::Display for StockShortfall {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} (requested {}, available {})",
            self.product_id, self.requested, self.available
        )
    }
}

/// Domain-level error.
///
/// Every variant is recoverable by the caller: fix the input, pick another id,
/// adjust quantities, or retry after a concurrent modification.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed or out-of-range input. Never retried.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An identifier was syntactically invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Unknown entity.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// The outlet does not hold enough stock for one or more products.
    #[error("insufficient stock: {}", format_shortfalls(.0))]
    InsufficientStock(Vec<StockShortfall>),

    /// A status change that the state machine does not allow.
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// RoleGate denial.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Lost an optimistic concurrency race; re-read and retry.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backing store could not serve the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

fn format_shortfalls(shortfalls: &[StockShortfall]) -> String {
    shortfalls
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl DomainError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn invalid_transition(from: impl ToString, to: impl ToString) -> Self {
        Self::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Product ids involved in a stock conflict (empty for other variants).
    pub fn conflicting_products(&self) -> Vec<ProductId> {
        match self {
            DomainError::InsufficientStock(shortfalls) => {
                shortfalls.iter().map(|s| s.product_id).collect()
            }
            _ => Vec::new(),
        }
    }
}
