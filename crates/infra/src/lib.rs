//! Infrastructure layer: storage seams, application services, config.
//!
//! Services are synchronous and `Send + Sync`; each one authorizes through
//! the RoleGate, drives the domain aggregates, commits through a repository
//! or the stock store, then emits notifications.

pub mod config;
pub mod repository;
pub mod services;
pub mod stock_store;
