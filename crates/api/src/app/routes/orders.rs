//! Order lifecycle endpoints.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use cantina_core::OrderId;
use cantina_orders::OrderRequest;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route("/batch", post(submit_batch))
        .route("/status-history", get(status_history))
        .route("/:id", get(get_order).put(replace_items).delete(delete_order))
        .route("/:id/close", post(close_order))
}

fn parse_order_id(raw: &str) -> Result<OrderId, axum::response::Response> {
    raw.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id")
    })
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<OrderRequest>,
) -> axum::response::Response {
    match services.orders.create(body).await {
        Ok(order) => (StatusCode::CREATED, Json(order)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.orders.list().await {
        Ok(orders) => Json(orders).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_order_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.orders.get(id).await {
        Ok(order) => Json(order).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn replace_items(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<OrderRequest>,
) -> axum::response::Response {
    let id = match parse_order_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.orders.replace_items(id, body).await {
        Ok(order) => Json(order).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn close_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_order_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.orders.close(id).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_order_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.orders.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn status_history(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.orders.status_history().await {
        Ok(history) => Json(history).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

/// Bulk submission: business rejections come back inside the summary body
/// with a 200, never as a failed request.
pub async fn submit_batch(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::BatchRequest>,
) -> axum::response::Response {
    match services.orders.submit_batch(body.orders).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
