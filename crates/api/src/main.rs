use std::sync::Arc;

use cantina_api::app;
use cantina_infra::PgOrderStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cantina_observability::init();

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost/cantina".to_string());
    let bind_addr =
        std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;
    let store = PgOrderStore::new(pool);
    store.migrate().await?;

    let services = Arc::new(app::services::AppServices::postgres(store));
    let router = app::build_app(services);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}
