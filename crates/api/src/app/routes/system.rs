use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use outletops_auth::RoleGate;

use crate::app::dto::WhoAmIResponse;
use crate::app::services::{self, AppServices};
use crate::context::AuthContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(ctx): Extension<AuthContext>) -> impl IntoResponse {
    let actor = ctx.actor();
    Json(WhoAmIResponse {
        principal_id: actor.principal_id().to_string(),
        role: actor.role(),
        outlet_id: actor.outlet_scope(),
        permitted_actions: RoleGate::new().permitted_actions(actor),
    })
}

pub async fn stream(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
) -> axum::response::Sse<impl tokio_stream::Stream<Item = Result<axum::response::sse::Event, std::convert::Infallible>>>
{
    services::actor_sse_stream(services, *ctx.actor())
}
