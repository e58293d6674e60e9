//! In-memory store.
//!
//! Same observable contract as the Postgres backend: all-or-nothing order
//! mutations, ledgered stock movements, fresh snapshots on every read. A
//! single mutex stands in for database transactions, which also gives batch
//! submission its "one batch at a time" isolation. Used by the API tests and
//! handy for local runs without a database.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use cantina_core::{DomainError, IngredientId, OrderId, ProductId};
use cantina_inventory::{
    InventoryItem, InventoryTransaction, StockLevels, TransactionReason,
};
use cantina_menu::{Composition, MenuItem};
use cantina_orders::{
    engine, BatchAccumulator, BatchOutcome, Order, OrderError, OrderRequest, OrderStatus,
    StatusChange,
};

use crate::error::StoreError;
use crate::store::{validate, InventoryStore, MenuStore, OrderStore};

#[derive(Debug, Default)]
struct State {
    menu: HashMap<ProductId, MenuItem>,
    inventory: HashMap<IngredientId, InventoryItem>,
    transactions: Vec<InventoryTransaction>,
    orders: HashMap<OrderId, Order>,
    history: Vec<StatusChange>,
}

impl State {
    fn compositions_for(
        &self,
        request: &OrderRequest,
    ) -> HashMap<ProductId, Composition> {
        request
            .items
            .iter()
            .filter_map(|line| {
                self.menu
                    .get(&line.product_id)
                    .map(|item| (line.product_id, Composition::from(item)))
            })
            .collect()
    }

    fn stock_view(&self) -> StockLevels {
        let mut view = StockLevels::new();
        for item in self.inventory.values() {
            view.insert(item.id, item.name.clone(), item.quantity);
        }
        view
    }

    /// The only write path for stock: adjust the item and append the ledger
    /// row together.
    fn apply_movement(
        &mut self,
        ingredient_id: IngredientId,
        change: f64,
        reason: TransactionReason,
        order_id: Option<OrderId>,
    ) {
        if let Some(item) = self.inventory.get_mut(&ingredient_id) {
            item.quantity = (item.quantity + change).max(0.0);
            if change < 0.0 && item.needs_reorder() {
                tracing::warn!(
                    ingredient = %item.name,
                    quantity = item.quantity,
                    reorder_level = item.reorder_level,
                    "stock at or below reorder level"
                );
            }
        }
        self.transactions.push(InventoryTransaction {
            id: Uuid::now_v7(),
            ingredient_id,
            quantity_change: change,
            reason,
            order_id,
            occurred_at: Utc::now(),
        });
    }

    /// Net quantities an order still holds reserved, per ingredient.
    fn held_by(&self, order_id: OrderId) -> Vec<(IngredientId, f64)> {
        let mut held: HashMap<IngredientId, f64> = HashMap::new();
        for txn in &self.transactions {
            if txn.order_id == Some(order_id) {
                *held.entry(txn.ingredient_id).or_default() += txn.quantity_change;
            }
        }
        let mut credits: Vec<(IngredientId, f64)> = held
            .into_iter()
            .filter(|(_, net)| *net < 0.0)
            .map(|(id, net)| (id, -net))
            .collect();
        credits.sort_by_key(|(id, _)| *id.as_uuid());
        credits
    }

    /// Credit back the net amount an order still holds reserved.
    fn release_reservation(&mut self, order_id: OrderId, reason: TransactionReason) {
        for (ingredient_id, amount) in self.held_by(order_id) {
            self.apply_movement(ingredient_id, amount, reason, Some(order_id));
        }
    }

    fn reserve(
        &mut self,
        order_id: OrderId,
        request: &OrderRequest,
    ) -> Result<engine::Assessment, StoreError> {
        let compositions = self.compositions_for(request);
        let stock = self.stock_view();
        let assessment =
            engine::assess(request, &compositions, &stock).map_err(OrderError::Rejected)?;
        for (ingredient_id, amount) in &assessment.consumption {
            self.apply_movement(
                *ingredient_id,
                -amount,
                TransactionReason::Usage,
                Some(order_id),
            );
        }
        Ok(assessment)
    }
}

/// Mutex-guarded store; cheap to clone is not needed, callers share it
/// behind an `Arc`.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    state: Mutex<State>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A poisoned mutex means a panic mid-mutation; propagating the panic
        // is the honest outcome.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, request: OrderRequest) -> Result<Order, StoreError> {
        engine::check_shape(&request).map_err(OrderError::Rejected)?;

        let mut state = self.lock();
        let order_id = OrderId::new();
        // Validation happens before any movement, so a rejection here leaves
        // the state untouched.
        let assessment = state.reserve(order_id, &request)?;

        let now = Utc::now();
        let order = Order {
            id: order_id,
            customer_name: assessment.customer_name,
            status: OrderStatus::Processing,
            allergens: request.allergens,
            total: Some(assessment.total),
            items: assessment.items,
            created_at: now,
            updated_at: now,
        };
        state.orders.insert(order_id, order.clone());
        state.history.push(StatusChange {
            order_id,
            status: OrderStatus::Processing,
            occurred_at: now,
        });
        Ok(order)
    }

    async fn replace_items(
        &self,
        id: OrderId,
        request: OrderRequest,
    ) -> Result<Order, StoreError> {
        engine::check_shape(&request).map_err(OrderError::Rejected)?;

        let mut state = self.lock();
        let status = state
            .orders
            .get(&id)
            .ok_or(OrderError::NotFound)?
            .status;
        if !status.is_editable() {
            return Err(OrderError::AlreadyClosed.into());
        }

        // Judge the new list against a staged view with the old reservation
        // credited back; ledger rows are only written once the outcome is
        // known, so a rejection leaves no trace.
        let mut view = state.stock_view();
        for (ingredient_id, amount) in state.held_by(id) {
            view.credit(&ingredient_id, amount);
        }
        let compositions = state.compositions_for(&request);
        let assessment =
            engine::assess(&request, &compositions, &view).map_err(OrderError::Rejected)?;

        state.release_reservation(id, TransactionReason::Annul);
        for (ingredient_id, amount) in &assessment.consumption {
            state.apply_movement(
                *ingredient_id,
                -amount,
                TransactionReason::Usage,
                Some(id),
            );
        }

        let now = Utc::now();
        let order = state.orders.get_mut(&id).ok_or(OrderError::NotFound)?;
        order.customer_name = assessment.customer_name;
        order.allergens = request.allergens;
        order.total = Some(assessment.total);
        order.items = assessment.items;
        order.updated_at = now;
        Ok(order.clone())
    }

    async fn close(&self, id: OrderId) -> Result<(), StoreError> {
        let mut state = self.lock();
        let order = state.orders.get_mut(&id).ok_or(OrderError::NotFound)?;
        if order.status != OrderStatus::Processing {
            return Err(OrderError::AlreadyClosed.into());
        }
        order.status = OrderStatus::Accepted;
        order.updated_at = Utc::now();
        state.history.push(StatusChange {
            order_id: id,
            status: OrderStatus::Accepted,
            occurred_at: Utc::now(),
        });
        Ok(())
    }

    async fn delete(&self, id: OrderId) -> Result<(), StoreError> {
        let mut state = self.lock();
        let status = state
            .orders
            .get(&id)
            .ok_or(OrderError::NotFound)?
            .status;
        if status == OrderStatus::Processing {
            state.release_reservation(id, TransactionReason::Cancelled);
        }
        state.orders.remove(&id);
        state.history.retain(|c| c.order_id != id);
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Order, StoreError> {
        let state = self.lock();
        state
            .orders
            .get(&id)
            .cloned()
            .ok_or_else(|| OrderError::NotFound.into())
    }

    async fn list(&self) -> Result<Vec<Order>, StoreError> {
        let state = self.lock();
        let mut orders: Vec<Order> = state.orders.values().cloned().collect();
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }

    async fn status_history(&self) -> Result<Vec<StatusChange>, StoreError> {
        Ok(self.lock().history.clone())
    }

    async fn submit_batch(
        &self,
        requests: Vec<OrderRequest>,
    ) -> Result<BatchOutcome, StoreError> {
        let mut state = self.lock();

        let mut view = state.stock_view();
        let mut acc = BatchAccumulator::new();
        for request in &requests {
            let compositions = state.compositions_for(request);
            match engine::assess(request, &compositions, &view) {
                Ok(assessment) => {
                    let order_id = OrderId::new();
                    for (ingredient_id, amount) in &assessment.consumption {
                        state.apply_movement(
                            *ingredient_id,
                            -amount,
                            TransactionReason::Usage,
                            Some(order_id),
                        );
                    }
                    assessment.apply_to(&mut view);

                    let now = Utc::now();
                    state.orders.insert(
                        order_id,
                        Order {
                            id: order_id,
                            customer_name: assessment.customer_name.clone(),
                            status: OrderStatus::Accepted,
                            allergens: request.allergens.clone(),
                            total: Some(assessment.total),
                            items: assessment.items.clone(),
                            created_at: now,
                            updated_at: now,
                        },
                    );
                    state.history.push(StatusChange {
                        order_id,
                        status: OrderStatus::Accepted,
                        occurred_at: now,
                    });
                    acc.record_accepted(order_id, &assessment);
                }
                Err(rejection) => {
                    acc.record_rejected(&request.customer_name, rejection.reason);
                }
            }
        }

        Ok(acc.finish(&view))
    }
}

#[async_trait]
impl MenuStore for InMemoryOrderStore {
    async fn create_menu_item(&self, item: MenuItem) -> Result<MenuItem, StoreError> {
        validate::menu_item(&item)?;
        let mut state = self.lock();
        for req in &item.ingredients {
            if !state.inventory.contains_key(&req.ingredient_id) {
                return Err(
                    DomainError::validation("unknown ingredient in composition").into()
                );
            }
        }
        state.menu.insert(item.id, item.clone());
        Ok(item)
    }

    async fn get_menu_item(&self, id: ProductId) -> Result<MenuItem, StoreError> {
        self.lock()
            .menu
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::NotFound.into())
    }

    async fn list_menu(&self) -> Result<Vec<MenuItem>, StoreError> {
        let state = self.lock();
        let mut items: Vec<MenuItem> = state.menu.values().cloned().collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }
}

#[async_trait]
impl InventoryStore for InMemoryOrderStore {
    async fn create_inventory_item(
        &self,
        item: InventoryItem,
    ) -> Result<InventoryItem, StoreError> {
        validate::inventory_item(&item)?;
        let mut state = self.lock();
        let initial = item.quantity;
        let mut stored = item.clone();
        stored.quantity = 0.0;
        state.inventory.insert(stored.id, stored);
        if initial > 0.0 {
            state.apply_movement(item.id, initial, TransactionReason::Restock, None);
        }
        Ok(item)
    }

    async fn restock(
        &self,
        id: IngredientId,
        amount: f64,
    ) -> Result<InventoryItem, StoreError> {
        validate::restock_amount(amount)?;
        let mut state = self.lock();
        if !state.inventory.contains_key(&id) {
            return Err(DomainError::NotFound.into());
        }
        state.apply_movement(id, amount, TransactionReason::Restock, None);
        state
            .inventory
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::NotFound.into())
    }

    async fn get_inventory_item(
        &self,
        id: IngredientId,
    ) -> Result<InventoryItem, StoreError> {
        self.lock()
            .inventory
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::NotFound.into())
    }

    async fn list_inventory(&self) -> Result<Vec<InventoryItem>, StoreError> {
        let state = self.lock();
        let mut items: Vec<InventoryItem> = state.inventory.values().cloned().collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn transactions(&self) -> Result<Vec<InventoryTransaction>, StoreError> {
        Ok(self.lock().transactions.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cantina_menu::IngredientRequirement;
    use cantina_orders::{ItemRequest, RejectReason};

    async fn seeded() -> (InMemoryOrderStore, ProductId, IngredientId, IngredientId) {
        let store = InMemoryOrderStore::new();
        let milk = IngredientId::new();
        let beans = IngredientId::new();
        store
            .create_inventory_item(InventoryItem {
                id: milk,
                name: "milk".into(),
                quantity: 500.0,
                reorder_level: 50.0,
                unit: "ml".into(),
                price: 0.01,
            })
            .await
            .unwrap();
        store
            .create_inventory_item(InventoryItem {
                id: beans,
                name: "espresso beans".into(),
                quantity: 100.0,
                reorder_level: 20.0,
                unit: "g".into(),
                price: 0.05,
            })
            .await
            .unwrap();

        let latte = ProductId::new();
        store
            .create_menu_item(MenuItem {
                id: latte,
                name: "latte".into(),
                description: "espresso with steamed milk".into(),
                tags: vec!["hot".into()],
                allergens: vec!["milk".into()],
                price: 4.5,
                ingredients: vec![
                    IngredientRequirement {
                        ingredient_id: milk,
                        quantity: 200.0,
                    },
                    IngredientRequirement {
                        ingredient_id: beans,
                        quantity: 18.0,
                    },
                ],
            })
            .await
            .unwrap();

        (store, latte, milk, beans)
    }

    fn latte_order(product: ProductId, quantity: u64) -> OrderRequest {
        OrderRequest {
            customer_name: "Alice".into(),
            allergens: vec![],
            items: vec![ItemRequest {
                product_id: product,
                quantity,
            }],
        }
    }

    #[tokio::test]
    async fn create_reserves_stock_and_logs_usage() {
        let (store, latte, milk, beans) = seeded().await;
        let order = store.create(latte_order(latte, 2)).await.unwrap();

        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.total, Some(9.0));
        assert_eq!(
            store.get_inventory_item(milk).await.unwrap().quantity,
            100.0
        );
        assert_eq!(
            store.get_inventory_item(beans).await.unwrap().quantity,
            64.0
        );

        let usage: Vec<_> = store
            .transactions()
            .await
            .unwrap()
            .into_iter()
            .filter(|t| t.reason == TransactionReason::Usage)
            .collect();
        // One debit row per ingredient for the whole order.
        assert_eq!(usage.len(), 2);
        assert!(usage.iter().all(|t| t.order_id == Some(order.id)));
    }

    #[tokio::test]
    async fn rejected_create_leaves_no_trace() {
        let (store, latte, milk, _) = seeded().await;
        let err = store.create(latte_order(latte, 5)).await.unwrap_err();

        match err {
            StoreError::Order(OrderError::Rejected(rejection)) => {
                assert_eq!(rejection.reason, RejectReason::InsufficientInventory);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            store.get_inventory_item(milk).await.unwrap().quantity,
            500.0
        );
        assert!(store.list().await.unwrap().is_empty());
        let usage = store
            .transactions()
            .await
            .unwrap()
            .into_iter()
            .filter(|t| t.reason == TransactionReason::Usage)
            .count();
        assert_eq!(usage, 0);
    }

    #[tokio::test]
    async fn delete_processing_credits_stock_back() {
        let (store, latte, milk, beans) = seeded().await;
        let order = store.create(latte_order(latte, 1)).await.unwrap();
        store.delete(order.id).await.unwrap();

        assert_eq!(
            store.get_inventory_item(milk).await.unwrap().quantity,
            500.0
        );
        assert_eq!(
            store.get_inventory_item(beans).await.unwrap().quantity,
            100.0
        );
        let cancelled = store
            .transactions()
            .await
            .unwrap()
            .into_iter()
            .filter(|t| t.reason == TransactionReason::Cancelled)
            .count();
        assert_eq!(cancelled, 2);
    }

    #[tokio::test]
    async fn delete_accepted_keeps_consumption() {
        let (store, latte, milk, _) = seeded().await;
        let order = store.create(latte_order(latte, 1)).await.unwrap();
        store.close(order.id).await.unwrap();
        store.delete(order.id).await.unwrap();

        // The sale happened; the stock stays consumed.
        assert_eq!(
            store.get_inventory_item(milk).await.unwrap().quantity,
            300.0
        );
    }

    #[tokio::test]
    async fn close_is_exactly_once() {
        let (store, latte, _, _) = seeded().await;
        let order = store.create(latte_order(latte, 1)).await.unwrap();

        store.close(order.id).await.unwrap();
        let err = store.close(order.id).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Order(OrderError::AlreadyClosed)
        ));
        assert_eq!(
            store.get(order.id).await.unwrap().status,
            OrderStatus::Accepted
        );
    }

    #[tokio::test]
    async fn replace_items_renegotiates_the_reservation() {
        let (store, latte, milk, _) = seeded().await;
        let order = store.create(latte_order(latte, 2)).await.unwrap();
        assert_eq!(store.get_inventory_item(milk).await.unwrap().quantity, 100.0);

        let updated = store
            .replace_items(order.id, latte_order(latte, 1))
            .await
            .unwrap();
        assert_eq!(updated.total, Some(4.5));
        // 2 lattes credited back, 1 debited again.
        assert_eq!(store.get_inventory_item(milk).await.unwrap().quantity, 300.0);
    }

    #[tokio::test]
    async fn rejected_replace_keeps_the_original_reservation() {
        let (store, latte, milk, _) = seeded().await;
        let order = store.create(latte_order(latte, 1)).await.unwrap();
        let ledger_before = store.transactions().await.unwrap();

        let err = store
            .replace_items(order.id, latte_order(latte, 10))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Order(OrderError::Rejected(_))
        ));
        // Net position is unchanged: the original latte is still reserved.
        assert_eq!(store.get_inventory_item(milk).await.unwrap().quantity, 300.0);
        assert_eq!(store.get(order.id).await.unwrap().total, Some(4.5));
        // And the ledger carries no trace of the failed attempt.
        assert_eq!(store.transactions().await.unwrap(), ledger_before);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_orders_never_oversell_stock() {
        let (store, latte, milk, _) = seeded().await;
        let store = std::sync::Arc::new(store);

        // Milk covers one 2-latte order (400ml of 500); two such orders
        // jointly exceed it.
        let a = tokio::spawn({
            let store = store.clone();
            async move { store.create(latte_order(latte, 2)).await }
        });
        let b = tokio::spawn({
            let store = store.clone();
            async move { store.create(latte_order(latte, 2)).await }
        });
        let (a, b) = tokio::join!(a, b);
        let results = [a.unwrap(), b.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let rejection = results
            .iter()
            .find_map(|r| match r {
                Err(StoreError::Order(OrderError::Rejected(rejection))) => Some(rejection),
                _ => None,
            })
            .expect("one order must be rejected");
        assert_eq!(rejection.reason, RejectReason::InsufficientInventory);

        let remaining = store.get_inventory_item(milk).await.unwrap().quantity;
        assert!(remaining >= 0.0);
        assert_eq!(remaining, 100.0);
    }

    #[tokio::test]
    async fn replace_after_close_is_rejected() {
        let (store, latte, _, _) = seeded().await;
        let order = store.create(latte_order(latte, 1)).await.unwrap();
        store.close(order.id).await.unwrap();

        let err = store
            .replace_items(order.id, latte_order(latte, 1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Order(OrderError::AlreadyClosed)
        ));
    }

    #[tokio::test]
    async fn batch_accepts_until_stock_runs_out() {
        let (store, latte, milk, _) = seeded().await;
        // Stock covers 2 lattes of milk (500 / 200).
        let requests = vec![
            latte_order(latte, 1),
            latte_order(latte, 1),
            latte_order(latte, 1),
        ];
        let outcome = store.submit_batch(requests).await.unwrap();

        assert_eq!(outcome.summary.total_orders, 3);
        assert_eq!(outcome.summary.accepted, 2);
        assert_eq!(outcome.summary.rejected, 1);
        assert_eq!(outcome.summary.total_revenue, 9.0);
        assert_eq!(store.get_inventory_item(milk).await.unwrap().quantity, 100.0);

        // Accepted batch orders land directly in `accepted`.
        for order in store.list().await.unwrap() {
            assert_eq!(order.status, OrderStatus::Accepted);
        }
        let rejected: Vec<_> = outcome
            .processed_orders
            .iter()
            .filter(|o| o.reason.is_some())
            .collect();
        assert_eq!(rejected.len(), 1);
        assert_eq!(
            rejected[0].reason,
            Some(RejectReason::InsufficientInventory)
        );
    }

    #[tokio::test]
    async fn restock_appends_ledger_row() {
        let (store, _, milk, _) = seeded().await;
        let item = store.restock(milk, 250.0).await.unwrap();
        assert_eq!(item.quantity, 750.0);

        let restocks = store
            .transactions()
            .await
            .unwrap()
            .into_iter()
            .filter(|t| t.reason == TransactionReason::Restock)
            .count();
        // Two seed restocks plus this one.
        assert_eq!(restocks, 3);
    }
}
