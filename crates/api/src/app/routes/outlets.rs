use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
    routing::{get, put},
};

use outletops_core::OutletId;
use outletops_infra::services::NewOutlet;

use crate::app::dto::SetOutletStatusRequest;
use crate::app::errors::{self, respond};
use crate::app::services::AppServices;
use crate::context::AuthContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_outlets).post(register_outlet))
        .route("/:id", get(get_outlet))
        .route("/:id/status", put(set_status))
}

pub async fn list_outlets(Extension(services): Extension<Arc<AppServices>>) -> Response {
    respond(StatusCode::OK, services.registry.catalog.list_outlets())
}

pub async fn get_outlet(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Response {
    let id: OutletId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(r) => return r,
    };
    respond(StatusCode::OK, services.registry.catalog.get_outlet(id))
}

pub async fn register_outlet(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    payload: Result<Json<NewOutlet>, JsonRejection>,
) -> Response {
    let new = match errors::body(payload) {
        Ok(v) => v,
        Err(r) => return r,
    };
    respond(StatusCode::CREATED, services.registry.catalog.register_outlet(ctx.actor(), new))
}

pub async fn set_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    payload: Result<Json<SetOutletStatusRequest>, JsonRejection>,
) -> Response {
    let id: OutletId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(r) => return r,
    };
    let req = match errors::body(payload) {
        Ok(v) => v,
        Err(r) => return r,
    };
    respond(
        StatusCode::OK,
        services.registry.catalog.set_outlet_status(ctx.actor(), id, req.status),
    )
}
