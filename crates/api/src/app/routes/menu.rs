//! Menu catalog endpoints.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use cantina_core::ProductId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_menu_item).get(list_menu))
        .route("/:id", get(get_menu_item))
}

pub async fn create_menu_item(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateMenuItemRequest>,
) -> axum::response::Response {
    match services.menu.create_menu_item(body.into_item()).await {
        Ok(item) => (StatusCode::CREATED, Json(item)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_menu(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.menu.list_menu().await {
        Ok(items) => Json(items).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_menu_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_id",
                "invalid menu item id",
            )
        }
    };
    match services.menu.get_menu_item(id).await {
        Ok(item) => Json(item).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
