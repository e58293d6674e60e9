//! Store traits: the seam between the HTTP surface and a backend.
//!
//! Every mutating order operation runs inside one backend transaction; no
//! partial state is ever observable. Implementations must guarantee that a
//! business-rule rejection leaves inventory and orders untouched.

use async_trait::async_trait;

use cantina_core::{IngredientId, OrderId, ProductId};
use cantina_inventory::{InventoryItem, InventoryTransaction};
use cantina_menu::MenuItem;
use cantina_orders::{BatchOutcome, Order, OrderRequest, StatusChange};

use crate::error::StoreError;

pub mod in_memory;
pub mod postgres;
mod validate;

/// Order lifecycle and batch submission.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Validate, reserve inventory and persist a new `processing` order
    /// atomically. On rejection nothing is committed.
    async fn create(&self, request: OrderRequest) -> Result<Order, StoreError>;

    /// Full item-list replace on a `processing` order: credit back the prior
    /// reservation (`annul`), then re-run the create validation against the
    /// new list. One transaction end to end.
    async fn replace_items(
        &self,
        id: OrderId,
        request: OrderRequest,
    ) -> Result<Order, StoreError>;

    /// `processing → accepted`; exactly once.
    async fn close(&self, id: OrderId) -> Result<(), StoreError>;

    /// Remove an order. A `processing` order first gets its reservation
    /// credited back (`cancelled`); an `accepted` one does not.
    async fn delete(&self, id: OrderId) -> Result<(), StoreError>;

    async fn get(&self, id: OrderId) -> Result<Order, StoreError>;

    async fn list(&self) -> Result<Vec<Order>, StoreError>;

    async fn status_history(&self) -> Result<Vec<StatusChange>, StoreError>;

    /// Process candidates independently under one elevated-isolation
    /// transaction. Business rejections never abort the batch; database
    /// faults roll the whole batch back.
    async fn submit_batch(
        &self,
        requests: Vec<OrderRequest>,
    ) -> Result<BatchOutcome, StoreError>;
}

/// Menu Catalog collaborator (plain CRUD; read-only for the engine).
#[async_trait]
pub trait MenuStore: Send + Sync {
    async fn create_menu_item(&self, item: MenuItem) -> Result<MenuItem, StoreError>;
    async fn get_menu_item(&self, id: ProductId) -> Result<MenuItem, StoreError>;
    async fn list_menu(&self) -> Result<Vec<MenuItem>, StoreError>;
}

/// Inventory collaborator. Quantities only ever change through the ledger,
/// so every mutation here appends a transaction row.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Create an item; a non-zero initial quantity is logged as `restock`.
    async fn create_inventory_item(
        &self,
        item: InventoryItem,
    ) -> Result<InventoryItem, StoreError>;

    /// Credit stock, logging a `restock` transaction.
    async fn restock(
        &self,
        id: IngredientId,
        amount: f64,
    ) -> Result<InventoryItem, StoreError>;

    async fn get_inventory_item(&self, id: IngredientId)
        -> Result<InventoryItem, StoreError>;

    async fn list_inventory(&self) -> Result<Vec<InventoryItem>, StoreError>;

    /// The append-only stock movement log, oldest first.
    async fn transactions(&self) -> Result<Vec<InventoryTransaction>, StoreError>;
}
