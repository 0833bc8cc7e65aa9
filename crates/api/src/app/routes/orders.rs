use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::{JsonRejection, QueryRejection}},
    http::StatusCode,
    response::Response,
    routing::{get, post, put},
};

use outletops_core::OrderId;
use outletops_infra::services::{NewCustomerOrder, NewFactoryOrder, OrderFilter};

use crate::app::dto::SetOrderStatusRequest;
use crate::app::errors::{self, respond};
use crate::app::services::AppServices;
use crate::context::AuthContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_orders))
        .route("/customer", post(create_customer_order))
        .route("/factory", post(create_factory_order))
        .route("/:id", get(get_order))
        .route("/:id/status", put(set_status))
}

pub async fn create_customer_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    payload: Result<Json<NewCustomerOrder>, JsonRejection>,
) -> Response {
    let new = match errors::body(payload) {
        Ok(v) => v,
        Err(r) => return r,
    };
    respond(
        StatusCode::CREATED,
        services.registry.orders.create_customer_order(ctx.actor(), new),
    )
}

pub async fn create_factory_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    payload: Result<Json<NewFactoryOrder>, JsonRejection>,
) -> Response {
    let new = match errors::body(payload) {
        Ok(v) => v,
        Err(r) => return r,
    };
    respond(
        StatusCode::CREATED,
        services.registry.orders.create_factory_order(ctx.actor(), new),
    )
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    params: Result<Query<OrderFilter>, QueryRejection>,
) -> Response {
    let filter = match errors::query(params) {
        Ok(v) => v,
        Err(r) => return r,
    };
    respond(StatusCode::OK, services.registry.orders.list_orders(ctx.actor(), &filter))
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Response {
    let id: OrderId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(r) => return r,
    };
    respond(StatusCode::OK, services.registry.orders.get_order(ctx.actor(), id))
}

pub async fn set_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    payload: Result<Json<SetOrderStatusRequest>, JsonRejection>,
) -> Response {
    let id: OrderId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(r) => return r,
    };
    let req = match errors::body(payload) {
        Ok(v) => v,
        Err(r) => return r,
    };
    if !ctx.matches_claimed_role(req.actor_role) {
        return errors::role_mismatch();
    }

    respond(
        StatusCode::OK,
        services.registry.orders.set_status(ctx.actor(), id, req.status),
    )
}
