use axum::{Router, routing::get};

pub mod orders;
pub mod outlets;
pub mod products;
pub mod returns;
pub mod stock;
pub mod system;

/// Router for every authenticated endpoint.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/stream", get(system::stream))
        .nest("/orders", orders::router())
        .nest("/returns", returns::router())
        .nest("/products", products::router())
        .nest("/outlets", outlets::router())
        .nest("/stock", stock::router())
}
