//! Catalog domain module: products and outlets.
//!
//! Business rules only (no IO, no HTTP, no storage). Products are never
//! deleted, only deactivated; every price change is kept in history.

pub mod outlet;
pub mod product;

pub use outlet::{
    ContactInfo, Outlet, OutletClosed, OutletCommand, OutletEvent, OutletOpened, OutletRegistered,
    OutletStatus, RegisterOutlet, SetOutletStatus,
};
pub use product::{
    CreateProduct, MeasuringUnit, PriceChange, PriceUpdated, Product, ProductActivated,
    ProductCommand, ProductCreated, ProductDeactivated, ProductEvent, SetProductStatus, UpdatePrice,
};
