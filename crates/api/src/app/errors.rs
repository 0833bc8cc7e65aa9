use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;

use outletops_core::{DomainError, DomainResult};

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn domain_error_to_response(err: DomainError) -> Response {
    let message = err.to_string();
    match err {
        DomainError::InvalidArgument(_) => json_error(StatusCode::BAD_REQUEST, "invalid_argument", message),
        DomainError::InvalidId(_) => json_error(StatusCode::BAD_REQUEST, "invalid_id", message),
        DomainError::NotFound { .. } => json_error(StatusCode::NOT_FOUND, "not_found", message),
        DomainError::InsufficientStock(shortfalls) => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "insufficient_stock",
                "message": message,
                "shortfalls": shortfalls,
            })),
        )
            .into_response(),
        DomainError::InvalidTransition { .. } => {
            json_error(StatusCode::CONFLICT, "invalid_transition", message)
        }
        DomainError::Unauthorized(_) => json_error(StatusCode::FORBIDDEN, "forbidden", message),
        DomainError::Conflict(_) => json_error(StatusCode::CONFLICT, "conflict", message),
        DomainError::Unavailable(_) => {
            tracing::error!("store unavailable: {message}");
            json_error(StatusCode::SERVICE_UNAVAILABLE, "unavailable", message)
        }
    }
}

/// Serialize a service result with `status`, or map its error.
pub fn respond<T: Serialize>(status: StatusCode, result: DomainResult<T>) -> Response {
    match result {
        Ok(value) => (status, Json(value)).into_response(),
        Err(e) => domain_error_to_response(e),
    }
}

/// Unwrap a JSON body, turning extractor rejections into a 400 with our error shape.
pub fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| json_error(StatusCode::BAD_REQUEST, "invalid_body", e.body_text()))
}

pub fn query<T>(params: Result<axum::extract::Query<T>, QueryRejection>) -> Result<T, Response> {
    params
        .map(|axum::extract::Query(v)| v)
        .map_err(|e| json_error(StatusCode::BAD_REQUEST, "invalid_query", e.body_text()))
}

/// Parse a path segment into a typed id (400 on garbage).
pub fn parse_id<T>(raw: &str) -> Result<T, Response>
where
    T: core::str::FromStr<Err = DomainError>,
{
    raw.parse().map_err(domain_error_to_response)
}

pub fn role_mismatch() -> Response {
    json_error(
        StatusCode::FORBIDDEN,
        "role_mismatch",
        "actorRole does not match the authenticated role",
    )
}
