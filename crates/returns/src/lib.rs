//! Returns domain module: outlet stock sent back to the factory.
//!
//! A return request never moves stock by itself; approval does, through the
//! ledger, at decision time.

pub mod request;

pub use request::{
    DecideReturn, RequestReturn, Return, ReturnApproved, ReturnCommand, ReturnDecision, ReturnEvent,
    ReturnItem, ReturnRejected, ReturnRequested, ReturnStatus,
};
