use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{json, Value};

use cantina_api::app::{self, services::AppServices};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory backend, ephemeral port.
        let app = app::build_app(Arc::new(AppServices::in_memory()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Seed one ingredient pair and a latte that consumes them; returns
/// (latte id, milk id). Milk covers two lattes.
async fn seed_cafe(client: &reqwest::Client, base_url: &str) -> (String, String) {
    let milk: Value = client
        .post(format!("{base_url}/inventory"))
        .json(&json!({
            "name": "milk",
            "quantity": 400.0,
            "reorder_level": 50.0,
            "unit": "ml",
            "price": 0.01,
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let milk_id = milk["ingredient_id"].as_str().unwrap().to_string();

    let beans: Value = client
        .post(format!("{base_url}/inventory"))
        .json(&json!({
            "name": "espresso beans",
            "quantity": 100.0,
            "unit": "g",
            "price": 0.05,
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let beans_id = beans["ingredient_id"].as_str().unwrap().to_string();

    let latte: Value = client
        .post(format!("{base_url}/menu"))
        .json(&json!({
            "name": "latte",
            "description": "espresso with steamed milk",
            "tags": ["hot"],
            "allergens": ["milk"],
            "price": 4.5,
            "ingredients": [
                { "ingredient_id": milk_id, "quantity": 200.0 },
                { "ingredient_id": beans_id, "quantity": 18.0 },
            ],
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let latte_id = latte["id"].as_str().unwrap().to_string();

    (latte_id, milk_id)
}

async fn inventory_quantity(client: &reqwest::Client, base_url: &str, id: &str) -> f64 {
    let item: Value = client
        .get(format!("{base_url}/inventory/{id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    item["quantity"].as_f64().unwrap()
}

#[tokio::test]
async fn health_endpoint_is_open() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(format!("{}/health", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn order_lifecycle_create_close_delete() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (latte_id, milk_id) = seed_cafe(&client, &srv.base_url).await;

    let res = client
        .post(format!("{}/orders", srv.base_url))
        .json(&json!({
            "customer_name": "Alice",
            "items": [{ "product_id": latte_id, "quantity": 1 }],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let order: Value = res.json().await.unwrap();
    assert_eq!(order["status"], "processing");
    assert_eq!(order["total"].as_f64().unwrap(), 4.5);
    let order_id = order["order_id"].as_str().unwrap().to_string();

    // Stock was reserved at creation.
    assert_eq!(inventory_quantity(&client, &srv.base_url, &milk_id).await, 200.0);

    let res = client
        .post(format!("{}/orders/{order_id}/close", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // Close is exactly-once.
    let res = client
        .post(format!("{}/orders/{order_id}/close", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Deleting an accepted order does not restore stock.
    let res = client
        .delete(format!("{}/orders/{order_id}", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(inventory_quantity(&client, &srv.base_url, &milk_id).await, 200.0);

    let res = client
        .get(format!("{}/orders/{order_id}", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_processing_order_restores_stock() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (latte_id, milk_id) = seed_cafe(&client, &srv.base_url).await;

    let order: Value = client
        .post(format!("{}/orders", srv.base_url))
        .json(&json!({
            "customer_name": "Bob",
            "items": [{ "product_id": latte_id, "quantity": 2 }],
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let order_id = order["order_id"].as_str().unwrap();
    assert_eq!(inventory_quantity(&client, &srv.base_url, &milk_id).await, 0.0);

    let res = client
        .delete(format!("{}/orders/{order_id}", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(inventory_quantity(&client, &srv.base_url, &milk_id).await, 400.0);
}

#[tokio::test]
async fn allergen_conflict_is_a_teapot() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (latte_id, milk_id) = seed_cafe(&client, &srv.base_url).await;

    let res = client
        .post(format!("{}/orders", srv.base_url))
        .json(&json!({
            "customer_name": "Carol",
            "allergens": ["Milk"],
            "items": [{ "product_id": latte_id, "quantity": 1 }],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::IM_A_TEAPOT);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["reason"], "allergen_conflict");
    assert_eq!(body["items"][0]["error"], "found allergen");
    assert_eq!(body["items"][0]["allergens"][0], "milk");

    // Rejection reserved nothing.
    assert_eq!(inventory_quantity(&client, &srv.base_url, &milk_id).await, 400.0);
}

#[tokio::test]
async fn insufficient_stock_reports_the_shortfall() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (latte_id, _) = seed_cafe(&client, &srv.base_url).await;

    let res = client
        .post(format!("{}/orders", srv.base_url))
        .json(&json!({
            "customer_name": "Dave",
            "items": [{ "product_id": latte_id, "quantity": 3 }],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FAILED_DEPENDENCY);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["reason"], "insufficient_inventory");
    assert_eq!(body["items"][0]["error"], "not enough in inventory");
    let shortfalls = body["items"][0]["not_enough"].as_array().unwrap();
    let milk_short = shortfalls
        .iter()
        .find(|s| s["inventory_name"] == "milk")
        .unwrap();
    // 3 lattes need 600ml against 400 in stock.
    assert_eq!(milk_short["not_enough"].as_f64().unwrap(), 200.0);
}

#[tokio::test]
async fn malformed_orders_echo_annotated_items() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (latte_id, _) = seed_cafe(&client, &srv.base_url).await;

    let res = client
        .post(format!("{}/orders", srv.base_url))
        .json(&json!({
            "customer_name": "Erin",
            "items": [
                { "product_id": latte_id, "quantity": 0 },
                { "product_id": latte_id, "quantity": 1 },
            ],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["reason"], "bad_input");
    let errors: Vec<_> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["error"].clone())
        .collect();
    assert!(errors.contains(&json!("zero quantity")));
    assert!(errors.contains(&json!("duplicated")));
}

#[tokio::test]
async fn unknown_menu_item_is_not_found() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    seed_cafe(&client, &srv.base_url).await;

    let res = client
        .post(format!("{}/orders", srv.base_url))
        .json(&json!({
            "customer_name": "Frank",
            "items": [{ "product_id": uuid::Uuid::now_v7(), "quantity": 1 }],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["reason"], "menu_item_not_found");
    assert_eq!(body["items"][0]["error"], "not found in menu");
}

#[tokio::test]
async fn batch_summarizes_accepted_and_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (latte_id, milk_id) = seed_cafe(&client, &srv.base_url).await;

    // Milk covers two lattes; the third candidate must bounce.
    let candidates: Vec<Value> = (0..3)
        .map(|i| {
            json!({
                "customer_name": format!("Guest {i}"),
                "items": [{ "product_id": latte_id, "quantity": 1 }],
            })
        })
        .collect();

    let res = client
        .post(format!("{}/orders/batch", srv.base_url))
        .json(&json!({ "orders": candidates }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["summary"]["total_orders"], 3);
    assert_eq!(body["summary"]["accepted"], 2);
    assert_eq!(body["summary"]["rejected"], 1);
    assert_eq!(body["summary"]["total_revenue"].as_f64().unwrap(), 9.0);

    let updates = body["summary"]["inventory_updates"].as_array().unwrap();
    let milk_update = updates.iter().find(|u| u["name"] == "milk").unwrap();
    assert_eq!(milk_update["quantity_used"].as_f64().unwrap(), 400.0);
    assert_eq!(milk_update["remaining"].as_f64().unwrap(), 0.0);
    assert_eq!(inventory_quantity(&client, &srv.base_url, &milk_id).await, 0.0);

    // Batch-accepted orders land directly in `accepted`.
    let orders: Vec<Value> = client
        .get(format!("{}/orders", srv.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(orders.len(), 2);
    assert!(orders.iter().all(|o| o["status"] == "accepted"));
}

#[tokio::test]
async fn replace_items_renegotiates_and_rejects_after_close() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (latte_id, milk_id) = seed_cafe(&client, &srv.base_url).await;

    let order: Value = client
        .post(format!("{}/orders", srv.base_url))
        .json(&json!({
            "customer_name": "Hana",
            "items": [{ "product_id": latte_id, "quantity": 2 }],
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let order_id = order["order_id"].as_str().unwrap().to_string();

    let res = client
        .put(format!("{}/orders/{order_id}", srv.base_url))
        .json(&json!({
            "customer_name": "Hana Lee",
            "items": [{ "product_id": latte_id, "quantity": 1 }],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["customer_name"], "Hana Lee");
    assert_eq!(updated["total"].as_f64().unwrap(), 4.5);
    assert_eq!(inventory_quantity(&client, &srv.base_url, &milk_id).await, 200.0);

    client
        .post(format!("{}/orders/{order_id}/close", srv.base_url))
        .send()
        .await
        .unwrap();

    let res = client
        .put(format!("{}/orders/{order_id}", srv.base_url))
        .json(&json!({
            "customer_name": "Hana",
            "items": [{ "product_id": latte_id, "quantity": 1 }],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn restock_and_ledger_are_visible() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (latte_id, milk_id) = seed_cafe(&client, &srv.base_url).await;

    let res = client
        .post(format!("{}/inventory/{milk_id}/restock", srv.base_url))
        .json(&json!({ "amount": 100.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let item: Value = res.json().await.unwrap();
    assert_eq!(item["quantity"].as_f64().unwrap(), 500.0);

    client
        .post(format!("{}/orders", srv.base_url))
        .json(&json!({
            "customer_name": "Ivy",
            "items": [{ "product_id": latte_id, "quantity": 1 }],
        }))
        .send()
        .await
        .unwrap();

    let ledger: Vec<Value> = client
        .get(format!("{}/inventory/transactions", srv.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let reasons: Vec<&str> = ledger.iter().map(|t| t["reason"].as_str().unwrap()).collect();
    assert!(reasons.contains(&"restock"));
    assert!(reasons.contains(&"usage"));
    // Usage rows reference the order that consumed the stock.
    assert!(ledger
        .iter()
        .filter(|t| t["reason"] == "usage")
        .all(|t| t["order_id"].is_string()));
}

#[tokio::test]
async fn status_history_records_transitions() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let (latte_id, _) = seed_cafe(&client, &srv.base_url).await;

    let order: Value = client
        .post(format!("{}/orders", srv.base_url))
        .json(&json!({
            "customer_name": "Jo",
            "items": [{ "product_id": latte_id, "quantity": 1 }],
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let order_id = order["order_id"].as_str().unwrap();

    client
        .post(format!("{}/orders/{order_id}/close", srv.base_url))
        .send()
        .await
        .unwrap();

    let history: Vec<Value> = client
        .get(format!("{}/orders/status-history", srv.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let statuses: Vec<&str> = history
        .iter()
        .filter(|c| c["order_id"] == *order_id)
        .map(|c| c["status"].as_str().unwrap())
        .collect();
    assert_eq!(statuses, vec!["processing", "accepted"]);
}
