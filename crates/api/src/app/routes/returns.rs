use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::{JsonRejection, QueryRejection}},
    http::StatusCode,
    response::Response,
    routing::get,
};

use outletops_core::ReturnId;
use outletops_infra::services::{NewReturn, ReturnFilter};

use crate::app::dto::DecideReturnRequest;
use crate::app::errors::{self, respond};
use crate::app::services::AppServices;
use crate::context::AuthContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_returns).post(create_return))
        .route("/:id", get(get_return).put(decide_return))
}

pub async fn create_return(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    payload: Result<Json<NewReturn>, JsonRejection>,
) -> Response {
    let new = match errors::body(payload) {
        Ok(v) => v,
        Err(r) => return r,
    };
    respond(StatusCode::CREATED, services.registry.returns.create_return(ctx.actor(), new))
}

pub async fn list_returns(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    params: Result<Query<ReturnFilter>, QueryRejection>,
) -> Response {
    let filter = match errors::query(params) {
        Ok(v) => v,
        Err(r) => return r,
    };
    respond(StatusCode::OK, services.registry.returns.list_returns(ctx.actor(), &filter))
}

pub async fn get_return(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Response {
    let id: ReturnId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(r) => return r,
    };
    respond(StatusCode::OK, services.registry.returns.get_return(ctx.actor(), id))
}

pub async fn decide_return(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    payload: Result<Json<DecideReturnRequest>, JsonRejection>,
) -> Response {
    let id: ReturnId = match errors::parse_id(&id) {
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
        services.registry.returns.decide(ctx.actor(), id, req.decision),
    )
}
