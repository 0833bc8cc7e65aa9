use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
    routing::{get, post},
};

use outletops_core::{OutletId, ProductId};

use crate::app::dto::AdjustStockRequest;
use crate::app::errors::{self, respond};
use crate::app::services::AppServices;
use crate::context::AuthContext;

pub fn router() -> Router {
    Router::new()
        .route("/:outlet_id", get(outlet_stock))
        .route("/:outlet_id/:product_id/adjust", post(adjust_stock))
}

pub async fn outlet_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(outlet_id): Path<String>,
) -> Response {
    let outlet_id: OutletId = match errors::parse_id(&outlet_id) {
        Ok(v) => v,
        Err(r) => return r,
    };
    respond(StatusCode::OK, services.registry.ledger.outlet_stock(ctx.actor(), outlet_id))
}

pub async fn adjust_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path((outlet_id, product_id)): Path<(String, String)>,
    payload: Result<Json<AdjustStockRequest>, JsonRejection>,
) -> Response {
    let outlet_id: OutletId = match errors::parse_id(&outlet_id) {
        Ok(v) => v,
        Err(r) => return r,
    };
    let product_id: ProductId = match errors::parse_id(&product_id) {
        Ok(v) => v,
        Err(r) => return r,
    };
    let req = match errors::body(payload) {
        Ok(v) => v,
        Err(r) => return r,
    };
    respond(
        StatusCode::OK,
        services
            .registry
            .ledger
            .adjust(ctx.actor(), outlet_id, product_id, req.delta),
    )
}
