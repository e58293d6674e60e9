//! Inventory endpoints. Stock only ever moves through the ledger.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use cantina_core::IngredientId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_inventory_item).get(list_inventory))
        .route("/transactions", get(list_transactions))
        .route("/:id", get(get_inventory_item))
        .route("/:id/restock", post(restock))
}

fn parse_ingredient_id(raw: &str) -> Result<IngredientId, axum::response::Response> {
    raw.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid inventory id")
    })
}

pub async fn create_inventory_item(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateInventoryItemRequest>,
) -> axum::response::Response {
    match services
        .inventory
        .create_inventory_item(body.into_item())
        .await
    {
        Ok(item) => (StatusCode::CREATED, Json(item)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_inventory(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.inventory.list_inventory().await {
        Ok(items) => Json(items).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_inventory_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_ingredient_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.inventory.get_inventory_item(id).await {
        Ok(item) => Json(item).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn restock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::RestockRequest>,
) -> axum::response::Response {
    let id = match parse_ingredient_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.inventory.restock(id, body.amount).await {
        Ok(item) => Json(item).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_transactions(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.inventory.transactions().await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
