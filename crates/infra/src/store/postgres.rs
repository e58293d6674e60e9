//! Postgres-backed stores.
//!
//! Every mutating order operation is one database transaction; inventory
//! rows touched by a reservation are locked with `SELECT … FOR UPDATE`
//! (ordered by id, so concurrent writers acquire locks in the same order).
//! Batch submission additionally upgrades to `REPEATABLE READ` because it
//! performs read-then-conditional-write over shared inventory rows across
//! many candidate orders.
//!
//! Only fixed parameterized statements are used; the validation algorithm
//! itself lives in [`cantina_orders::engine`] and never sees SQL.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use cantina_core::{DomainError, IngredientId, OrderId, ProductId};
use cantina_inventory::{
    InventoryItem, InventoryTransaction, StockLevels, TransactionReason,
};
use cantina_menu::{Composition, IngredientRequirement, MenuItem};
use cantina_orders::{
    engine, BatchAccumulator, BatchOutcome, Order, OrderError, OrderItem, OrderRequest,
    OrderStatus, StatusChange,
};

use crate::error::StoreError;
use crate::store::{validate, InventoryStore, MenuStore, OrderStore};

/// Postgres order/menu/inventory store over a shared connection pool.
#[derive(Debug, Clone)]
pub struct PgOrderStore {
    pool: Arc<PgPool>,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Apply embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&*self.pool)
            .await
            .map_err(|e| StoreError::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Validate a request against catalog + locked stock inside `tx` and, on
    /// success, persist items, debits and total for `order_id`.
    ///
    /// Shared by create, replace-items and batch submission; the caller owns
    /// the transaction and the order row.
    async fn reserve_into(
        tx: &mut Transaction<'_, Postgres>,
        order_id: OrderId,
        request: &OrderRequest,
    ) -> Result<engine::Assessment, StoreError> {
        let product_ids: Vec<ProductId> =
            request.items.iter().map(|i| i.product_id).collect();
        let compositions = compositions_for(tx, &product_ids).await?;
        let ingredient_ids = ingredient_ids_of(&compositions);
        let stock = lock_stock(tx, &ingredient_ids).await?;

        let assessment = engine::assess(request, &compositions, &stock)
            .map_err(OrderError::Rejected)?;

        for item in &assessment.items {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, quantity) VALUES ($1, $2, $3)",
            )
            .bind(order_id.as_uuid())
            .bind(item.product_id.as_uuid())
            .bind(item.quantity as i64)
            .execute(&mut **tx)
            .await?;
        }

        // One batched debit + one usage transaction per ingredient, even when
        // several lines share it.
        for (ingredient_id, amount) in &assessment.consumption {
            apply_movement(
                tx,
                *ingredient_id,
                -amount,
                TransactionReason::Usage,
                Some(order_id),
            )
            .await?;
        }

        sqlx::query("UPDATE orders SET total = $1, updated_at = $2 WHERE id = $3")
            .bind(assessment.total)
            .bind(Utc::now())
            .bind(order_id.as_uuid())
            .execute(&mut **tx)
            .await?;

        Ok(assessment)
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    #[instrument(skip(self, request), fields(customer = %request.customer_name))]
    async fn create(&self, request: OrderRequest) -> Result<Order, StoreError> {
        // Fail fast on malformed shape before opening a transaction.
        let customer_name = engine::check_shape(&request).map_err(OrderError::Rejected)?;

        let mut tx = self.pool.begin().await?;
        let order_id = OrderId::new();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_name, status, allergens, created_at, updated_at)
            VALUES ($1, $2, 'processing', $3, $4, $4)
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(customer_name.as_str())
        .bind(&request.allergens)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        append_status(&mut tx, order_id, OrderStatus::Processing).await?;

        let assessment = Self::reserve_into(&mut tx, order_id, &request).await?;
        tx.commit().await?;

        tracing::info!(%order_id, total = assessment.total, "order created");
        Ok(Order {
            id: order_id,
            customer_name: assessment.customer_name,
            status: OrderStatus::Processing,
            allergens: request.allergens,
            total: Some(assessment.total),
            items: assessment.items,
            created_at: now,
            updated_at: now,
        })
    }

    #[instrument(skip(self, request), fields(%id))]
    async fn replace_items(
        &self,
        id: OrderId,
        request: OrderRequest,
    ) -> Result<Order, StoreError> {
        let customer_name = engine::check_shape(&request).map_err(OrderError::Rejected)?;

        let mut tx = self.pool.begin().await?;

        let status = lock_order_status(&mut tx, id).await?;
        if !status.is_editable() {
            return Err(OrderError::AlreadyClosed.into());
        }

        // Credit back whatever this order had reserved, then start over.
        release_reservation(&mut tx, id, TransactionReason::Annul).await?;
        sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;

        let now = Utc::now();
        sqlx::query(
            "UPDATE orders SET customer_name = $1, allergens = $2, updated_at = $3 WHERE id = $4",
        )
        .bind(customer_name.as_str())
        .bind(&request.allergens)
        .bind(now)
        .bind(id.as_uuid())
        .execute(&mut *tx)
        .await?;

        let assessment = Self::reserve_into(&mut tx, id, &request).await?;
        tx.commit().await?;

        tracing::info!(order_id = %id, total = assessment.total, "order items replaced");
        self.get(id).await
    }

    #[instrument(skip(self), fields(%id))]
    async fn close(&self, id: OrderId) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let status = lock_order_status(&mut tx, id).await?;
        if status != OrderStatus::Processing {
            return Err(OrderError::AlreadyClosed.into());
        }

        sqlx::query("UPDATE orders SET status = 'accepted', updated_at = $1 WHERE id = $2")
            .bind(Utc::now())
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;
        append_status(&mut tx, id, OrderStatus::Accepted).await?;

        tx.commit().await?;
        tracing::info!(order_id = %id, "order closed");
        Ok(())
    }

    #[instrument(skip(self), fields(%id))]
    async fn delete(&self, id: OrderId) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let status = lock_order_status(&mut tx, id).await?;
        if status == OrderStatus::Processing {
            // The sale never happened; put the stock back.
            release_reservation(&mut tx, id, TransactionReason::Cancelled).await?;
        }

        sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(order_id = %id, "order deleted");
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Order, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, customer_name, status, allergens, total, created_at, updated_at
            FROM orders WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await?
        .ok_or(OrderError::NotFound)?;

        let mut order = order_from_row(&row)?;
        order.items = order_items(&*self.pool, id).await?;
        Ok(order)
    }

    async fn list(&self) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, customer_name, status, allergens, total, created_at, updated_at
            FROM orders ORDER BY created_at
            "#,
        )
        .fetch_all(&*self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let mut order = order_from_row(&row)?;
            order.items = order_items(&*self.pool, order.id).await?;
            orders.push(order);
        }
        Ok(orders)
    }

    async fn status_history(&self) -> Result<Vec<StatusChange>, StoreError> {
        let rows = sqlx::query(
            "SELECT order_id, status, occurred_at FROM order_status_history ORDER BY id",
        )
        .fetch_all(&*self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(StatusChange {
                    order_id: OrderId::from_uuid(row.try_get("order_id")?),
                    status: parse_status(row.try_get::<String, _>("status")?)?,
                    occurred_at: row.try_get("occurred_at")?,
                })
            })
            .collect()
    }

    #[instrument(skip(self, requests), fields(candidates = requests.len()))]
    async fn submit_batch(
        &self,
        requests: Vec<OrderRequest>,
    ) -> Result<BatchOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;
        // Two concurrent batches must not both observe and consume the same
        // stock snapshot.
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await?;

        let product_ids: Vec<ProductId> = requests
            .iter()
            .flat_map(|r| r.items.iter().map(|i| i.product_id))
            .collect();
        let compositions = compositions_for(&mut tx, &product_ids).await?;
        let ingredient_ids = ingredient_ids_of(&compositions);
        let mut stock = lock_stock(&mut tx, &ingredient_ids).await?;

        let mut acc = BatchAccumulator::new();
        for request in &requests {
            match engine::assess(request, &compositions, &stock) {
                Ok(assessment) => {
                    let order_id = OrderId::new();
                    let now = Utc::now();
                    // Batch orders skip `processing` and land accepted.
                    sqlx::query(
                        r#"
                        INSERT INTO orders (id, customer_name, status, allergens, total, created_at, updated_at)
                        VALUES ($1, $2, 'accepted', $3, $4, $5, $5)
                        "#,
                    )
                    .bind(order_id.as_uuid())
                    .bind(assessment.customer_name.as_str())
                    .bind(&request.allergens)
                    .bind(assessment.total)
                    .bind(now)
                    .execute(&mut *tx)
                    .await?;
                    append_status(&mut tx, order_id, OrderStatus::Accepted).await?;

                    for item in &assessment.items {
                        sqlx::query(
                            "INSERT INTO order_items (order_id, product_id, quantity) VALUES ($1, $2, $3)",
                        )
                        .bind(order_id.as_uuid())
                        .bind(item.product_id.as_uuid())
                        .bind(item.quantity as i64)
                        .execute(&mut *tx)
                        .await?;
                    }
                    for (ingredient_id, amount) in &assessment.consumption {
                        apply_movement(
                            &mut tx,
                            *ingredient_id,
                            -amount,
                            TransactionReason::Usage,
                            Some(order_id),
                        )
                        .await?;
                    }

                    assessment.apply_to(&mut stock);
                    acc.record_accepted(order_id, &assessment);
                }
                Err(rejection) => {
                    acc.record_rejected(&request.customer_name, rejection.reason);
                }
            }
        }

        tx.commit().await?;
        let outcome = acc.finish(&stock);
        tracing::info!(
            accepted = outcome.summary.accepted,
            rejected = outcome.summary.rejected,
            "batch processed"
        );
        Ok(outcome)
    }
}

#[async_trait]
impl MenuStore for PgOrderStore {
    #[instrument(skip(self, item), fields(name = %item.name))]
    async fn create_menu_item(&self, item: MenuItem) -> Result<MenuItem, StoreError> {
        validate::menu_item(&item)?;

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO menu_items (id, name, description, tags, allergens, price)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(&item.name)
        .bind(&item.description)
        .bind(&item.tags)
        .bind(&item.allergens)
        .bind(item.price)
        .execute(&mut *tx)
        .await?;

        for req in &item.ingredients {
            sqlx::query(
                "INSERT INTO menu_item_ingredients (product_id, inventory_id, quantity) VALUES ($1, $2, $3)",
            )
            .bind(item.id.as_uuid())
            .bind(req.ingredient_id.as_uuid())
            .bind(req.quantity)
            .execute(&mut *tx)
            .await
            .map_err(unknown_ingredient)?;
        }

        tx.commit().await?;
        Ok(item)
    }

    async fn get_menu_item(&self, id: ProductId) -> Result<MenuItem, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, description, tags, allergens, price FROM menu_items WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await?
        .ok_or(DomainError::NotFound)?;

        let mut item = menu_item_from_row(&row)?;
        item.ingredients = menu_ingredients(&*self.pool, id).await?;
        Ok(item)
    }

    async fn list_menu(&self) -> Result<Vec<MenuItem>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, description, tags, allergens, price FROM menu_items ORDER BY name",
        )
        .fetch_all(&*self.pool)
        .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let mut item = menu_item_from_row(&row)?;
            item.ingredients = menu_ingredients(&*self.pool, item.id).await?;
            items.push(item);
        }
        Ok(items)
    }
}

#[async_trait]
impl InventoryStore for PgOrderStore {
    #[instrument(skip(self, item), fields(name = %item.name))]
    async fn create_inventory_item(
        &self,
        item: InventoryItem,
    ) -> Result<InventoryItem, StoreError> {
        validate::inventory_item(&item)?;

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO inventory_items (id, name, quantity, reorder_level, unit, price)
            VALUES ($1, $2, 0, $3, $4, $5)
            "#,
        )
        .bind(item.id.as_uuid())
        .bind(&item.name)
        .bind(item.reorder_level)
        .bind(&item.unit)
        .bind(item.price)
        .execute(&mut *tx)
        .await?;

        if item.quantity > 0.0 {
            apply_movement(&mut tx, item.id, item.quantity, TransactionReason::Restock, None)
                .await?;
        }

        tx.commit().await?;
        Ok(item)
    }

    #[instrument(skip(self), fields(%id, amount))]
    async fn restock(
        &self,
        id: IngredientId,
        amount: f64,
    ) -> Result<InventoryItem, StoreError> {
        validate::restock_amount(amount)?;

        let mut tx = self.pool.begin().await?;
        let exists = sqlx::query("SELECT 1 FROM inventory_items WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(DomainError::NotFound.into());
        }

        apply_movement(&mut tx, id, amount, TransactionReason::Restock, None).await?;
        tx.commit().await?;

        self.get_inventory_item(id).await
    }

    async fn get_inventory_item(
        &self,
        id: IngredientId,
    ) -> Result<InventoryItem, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, quantity, reorder_level, unit, price FROM inventory_items WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await?
        .ok_or(DomainError::NotFound)?;

        Ok(inventory_item_from_row(&row)?)
    }

    async fn list_inventory(&self) -> Result<Vec<InventoryItem>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, quantity, reorder_level, unit, price FROM inventory_items ORDER BY name",
        )
        .fetch_all(&*self.pool)
        .await?;

        rows.iter()
            .map(|row| Ok(inventory_item_from_row(row)?))
            .collect()
    }

    async fn transactions(&self) -> Result<Vec<InventoryTransaction>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, inventory_id, quantity_change, reason, order_id, occurred_at
            FROM inventory_transactions ORDER BY occurred_at, id
            "#,
        )
        .fetch_all(&*self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(InventoryTransaction {
                    id: row.try_get("id").map_err(StoreError::Database)?,
                    ingredient_id: IngredientId::from_uuid(
                        row.try_get("inventory_id").map_err(StoreError::Database)?,
                    ),
                    quantity_change: row
                        .try_get("quantity_change")
                        .map_err(StoreError::Database)?,
                    reason: row
                        .try_get::<String, _>("reason")
                        .map_err(StoreError::Database)?
                        .parse()
                        .map_err(StoreError::Domain)?,
                    order_id: row
                        .try_get::<Option<Uuid>, _>("order_id")
                        .map_err(StoreError::Database)?
                        .map(OrderId::from_uuid),
                    occurred_at: row.try_get("occurred_at").map_err(StoreError::Database)?,
                })
            })
            .collect()
    }
}

// ---- transaction-scoped helpers -------------------------------------------

/// Lock the order row and return its status, or `NotFound`.
async fn lock_order_status(
    tx: &mut Transaction<'_, Postgres>,
    id: OrderId,
) -> Result<OrderStatus, StoreError> {
    let row = sqlx::query("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
        .bind(id.as_uuid())
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(OrderError::NotFound)?;
    Ok(parse_status(row.try_get::<String, _>("status")?)?)
}

/// Menu compositions for the referenced products. Products missing from the
/// result were not found on the menu.
async fn compositions_for(
    tx: &mut Transaction<'_, Postgres>,
    product_ids: &[ProductId],
) -> Result<HashMap<ProductId, Composition>, StoreError> {
    let ids: Vec<Uuid> = product_ids.iter().map(|p| *p.as_uuid()).collect();

    let rows = sqlx::query(
        "SELECT id, price, allergens FROM menu_items WHERE id = ANY($1)",
    )
    .bind(&ids)
    .fetch_all(&mut **tx)
    .await?;

    let mut compositions = HashMap::with_capacity(rows.len());
    for row in rows {
        compositions.insert(
            ProductId::from_uuid(row.try_get("id")?),
            Composition {
                price: row.try_get("price")?,
                allergens: row.try_get("allergens")?,
                ingredients: Vec::new(),
            },
        );
    }

    let rows = sqlx::query(
        "SELECT product_id, inventory_id, quantity FROM menu_item_ingredients WHERE product_id = ANY($1)",
    )
    .bind(&ids)
    .fetch_all(&mut **tx)
    .await?;
    for row in rows {
        let product_id = ProductId::from_uuid(row.try_get("product_id")?);
        if let Some(comp) = compositions.get_mut(&product_id) {
            comp.ingredients.push(IngredientRequirement {
                ingredient_id: IngredientId::from_uuid(row.try_get("inventory_id")?),
                quantity: row.try_get("quantity")?,
            });
        }
    }

    Ok(compositions)
}

fn ingredient_ids_of(compositions: &HashMap<ProductId, Composition>) -> Vec<IngredientId> {
    let mut ids: Vec<IngredientId> = compositions
        .values()
        .flat_map(|c| c.ingredients.iter().map(|r| r.ingredient_id))
        .collect();
    ids.sort_unstable_by_key(|id| *id.as_uuid());
    ids.dedup();
    ids
}

/// Lock the referenced inventory rows (ordered by id) and snapshot them.
///
/// Sufficiency checks and debits against these rows form one critical
/// section for the rest of the transaction.
async fn lock_stock(
    tx: &mut Transaction<'_, Postgres>,
    ingredient_ids: &[IngredientId],
) -> Result<StockLevels, StoreError> {
    let ids: Vec<Uuid> = ingredient_ids.iter().map(|i| *i.as_uuid()).collect();
    let rows = sqlx::query(
        "SELECT id, name, quantity FROM inventory_items WHERE id = ANY($1) ORDER BY id FOR UPDATE",
    )
    .bind(&ids)
    .fetch_all(&mut **tx)
    .await?;

    let mut stock = StockLevels::new();
    for row in rows {
        stock.insert(
            IngredientId::from_uuid(row.try_get("id")?),
            row.try_get::<String, _>("name")?,
            row.try_get("quantity")?,
        );
    }
    Ok(stock)
}

/// The only write path for stock: adjust the running quantity and append the
/// matching ledger row in the same atomic step.
async fn apply_movement(
    tx: &mut Transaction<'_, Postgres>,
    ingredient_id: IngredientId,
    change: f64,
    reason: TransactionReason,
    order_id: Option<OrderId>,
) -> Result<(), StoreError> {
    let row = sqlx::query(
        r#"
        UPDATE inventory_items SET quantity = quantity + $1 WHERE id = $2
        RETURNING name, quantity, reorder_level
        "#,
    )
    .bind(change)
    .bind(ingredient_id.as_uuid())
    .fetch_one(&mut **tx)
    .await?;
    if change < 0.0 {
        let name: String = row.try_get("name")?;
        let quantity: f64 = row.try_get("quantity")?;
        let reorder_level: f64 = row.try_get("reorder_level")?;
        if quantity <= reorder_level {
            tracing::warn!(
                ingredient = %name,
                quantity,
                reorder_level,
                "stock at or below reorder level"
            );
        }
    }

    sqlx::query(
        r#"
        INSERT INTO inventory_transactions (id, inventory_id, quantity_change, reason, order_id, occurred_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(Uuid::now_v7())
    .bind(ingredient_id.as_uuid())
    .bind(change)
    .bind(reason.as_str())
    .bind(order_id.map(|o| *o.as_uuid()))
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Credit back everything an order still holds reserved.
///
/// The net of the order's ledger rows (usage minus prior credits) is what it
/// currently holds, so repeated replace/delete cycles stay balanced.
async fn release_reservation(
    tx: &mut Transaction<'_, Postgres>,
    order_id: OrderId,
    reason: TransactionReason,
) -> Result<(), StoreError> {
    let rows = sqlx::query(
        r#"
        SELECT inventory_id, -SUM(quantity_change) AS reserved
        FROM inventory_transactions
        WHERE order_id = $1
        GROUP BY inventory_id
        HAVING SUM(quantity_change) < 0
        ORDER BY inventory_id
        "#,
    )
    .bind(order_id.as_uuid())
    .fetch_all(&mut **tx)
    .await?;

    for row in rows {
        let ingredient_id = IngredientId::from_uuid(row.try_get("inventory_id")?);
        let reserved: f64 = row.try_get("reserved")?;
        apply_movement(tx, ingredient_id, reserved, reason, Some(order_id)).await?;
    }
    Ok(())
}

async fn append_status(
    tx: &mut Transaction<'_, Postgres>,
    order_id: OrderId,
    status: OrderStatus,
) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO order_status_history (order_id, status, occurred_at) VALUES ($1, $2, $3)",
    )
    .bind(order_id.as_uuid())
    .bind(status.as_str())
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

// ---- row mapping ----------------------------------------------------------

fn parse_status(raw: String) -> Result<OrderStatus, DomainError> {
    raw.parse()
}

fn order_from_row(row: &sqlx::postgres::PgRow) -> Result<Order, StoreError> {
    Ok(Order {
        id: OrderId::from_uuid(row.try_get("id")?),
        customer_name: cantina_core::CustomerName::parse(
            row.try_get::<String, _>("customer_name")?,
        )
        .map_err(StoreError::Domain)?,
        status: parse_status(row.try_get::<String, _>("status")?)?,
        allergens: row.try_get("allergens")?,
        total: row.try_get("total")?,
        items: Vec::new(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

async fn order_items(pool: &PgPool, order_id: OrderId) -> Result<Vec<OrderItem>, StoreError> {
    let rows = sqlx::query(
        "SELECT product_id, quantity FROM order_items WHERE order_id = $1",
    )
    .bind(order_id.as_uuid())
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(OrderItem {
                product_id: ProductId::from_uuid(
                    row.try_get("product_id").map_err(StoreError::Database)?,
                ),
                quantity: row
                    .try_get::<i64, _>("quantity")
                    .map_err(StoreError::Database)? as u64,
            })
        })
        .collect()
}

fn menu_item_from_row(row: &sqlx::postgres::PgRow) -> Result<MenuItem, StoreError> {
    Ok(MenuItem {
        id: ProductId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        tags: row.try_get("tags")?,
        allergens: row.try_get("allergens")?,
        price: row.try_get("price")?,
        ingredients: Vec::new(),
    })
}

async fn menu_ingredients(
    pool: &PgPool,
    product_id: ProductId,
) -> Result<Vec<IngredientRequirement>, StoreError> {
    let rows = sqlx::query(
        "SELECT inventory_id, quantity FROM menu_item_ingredients WHERE product_id = $1",
    )
    .bind(product_id.as_uuid())
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(IngredientRequirement {
                ingredient_id: IngredientId::from_uuid(
                    row.try_get("inventory_id").map_err(StoreError::Database)?,
                ),
                quantity: row.try_get("quantity").map_err(StoreError::Database)?,
            })
        })
        .collect()
}

fn inventory_item_from_row(row: &sqlx::postgres::PgRow) -> Result<InventoryItem, sqlx::Error> {
    Ok(InventoryItem {
        id: IngredientId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        quantity: row.try_get("quantity")?,
        reorder_level: row.try_get("reorder_level")?,
        unit: row.try_get("unit")?,
        price: row.try_get("price")?,
    })
}

/// Map a foreign-key violation on ingredient insert to a validation error.
fn unknown_ingredient(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some("23503") {
            return DomainError::validation("unknown ingredient in composition").into();
        }
    }
    err.into()
}
