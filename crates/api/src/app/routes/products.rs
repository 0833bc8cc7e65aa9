use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
    routing::{get, put},
};

use outletops_core::ProductId;
use outletops_infra::services::NewProduct;

use crate::app::dto::{SetProductStatusRequest, UpdatePriceRequest};
use crate::app::errors::{self, respond};
use crate::app::services::AppServices;
use crate::context::AuthContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/:id", get(get_product))
        .route("/:id/price", put(update_price))
        .route("/:id/status", put(set_status))
}

pub async fn list_products(Extension(services): Extension<Arc<AppServices>>) -> Response {
    respond(StatusCode::OK, services.registry.catalog.list_products())
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let id: ProductId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(r) => return r,
    };
    respond(StatusCode::OK, services.registry.catalog.get_product(id))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    payload: Result<Json<NewProduct>, JsonRejection>,
) -> Response {
    let new = match errors::body(payload) {
        Ok(v) => v,
        Err(r) => return r,
    };
    respond(StatusCode::CREATED, services.registry.catalog.create_product(ctx.actor(), new))
}

pub async fn update_price(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    payload: Result<Json<UpdatePriceRequest>, JsonRejection>,
) -> Response {
    let id: ProductId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(r) => return r,
    };
    let req = match errors::body(payload) {
        Ok(v) => v,
        Err(r) => return r,
    };
    respond(
        StatusCode::OK,
        services.registry.catalog.update_price(ctx.actor(), id, req.price),
    )
}

pub async fn set_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    payload: Result<Json<SetProductStatusRequest>, JsonRejection>,
) -> Response {
    let id: ProductId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(r) => return r,
    };
    let req = match errors::body(payload) {
        Ok(v) => v,
        Err(r) => return r,
    };
    respond(
        StatusCode::OK,
        services.registry.catalog.set_product_status(ctx.actor(), id, req.active),
    )
}
