use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use cantina_core::DomainError;
use cantina_infra::StoreError;
use cantina_orders::{OrderError, RejectReason};

/// Map a store failure to its HTTP shape.
///
/// Rejections carry their full diagnostic body (annotated item list for bad
/// input, shortfall detail for stock) so the client sees every flaw at once.
pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Order(OrderError::Rejected(rejection)) => {
            let status = match rejection.reason {
                RejectReason::AllergenConflict => StatusCode::IM_A_TEAPOT,
                RejectReason::MenuItemNotFound => StatusCode::NOT_FOUND,
                RejectReason::InsufficientInventory => StatusCode::FAILED_DEPENDENCY,
                RejectReason::BadInput => StatusCode::BAD_REQUEST,
            };
            (status, axum::Json(rejection)).into_response()
        }
        StoreError::Order(OrderError::NotFound) => {
            json_error(StatusCode::NOT_FOUND, "not_found", "order not found")
        }
        StoreError::Order(OrderError::AlreadyClosed) => json_error(
            StatusCode::BAD_REQUEST,
            "already_closed",
            "order is no longer editable",
        ),
        StoreError::Order(OrderError::Domain(e)) => domain_error_to_response(e),
        StoreError::Domain(e) => domain_error_to_response(e),
        StoreError::Database(e) => {
            tracing::error!(error = %e, "storage failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
                "internal storage failure",
            )
        }
    }
}

fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Validation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
