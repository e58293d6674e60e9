use axum::Router;

pub mod inventory;
pub mod menu;
pub mod orders;
pub mod system;

/// Router for all service endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/orders", orders::router())
        .nest("/menu", menu::router())
        .nest("/inventory", inventory::router())
}
