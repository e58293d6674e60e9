//! Request DTOs and JSON mapping helpers.
//!
//! Order submission deserializes straight into [`cantina_orders::OrderRequest`];
//! the DTOs here cover the collaborator CRUD where the stored shape carries a
//! server-generated id.

use serde::Deserialize;

use cantina_core::{IngredientId, ProductId};
use cantina_inventory::InventoryItem;
use cantina_menu::{IngredientRequirement, MenuItem};

#[derive(Debug, Deserialize)]
pub struct IngredientLine {
    pub ingredient_id: IngredientId,
    pub quantity: f64,
}

#[derive(Debug, Deserialize)]
pub struct CreateMenuItemRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub allergens: Vec<String>,
    pub price: f64,
    #[serde(default)]
    pub ingredients: Vec<IngredientLine>,
}

impl CreateMenuItemRequest {
    pub fn into_item(self) -> MenuItem {
        MenuItem {
            id: ProductId::new(),
            name: self.name,
            description: self.description,
            tags: self.tags,
            allergens: self.allergens,
            price: self.price,
            ingredients: self
                .ingredients
                .into_iter()
                .map(|l| IngredientRequirement {
                    ingredient_id: l.ingredient_id,
                    quantity: l.quantity,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateInventoryItemRequest {
    pub name: String,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub reorder_level: f64,
    pub unit: String,
    #[serde(default)]
    pub price: f64,
}

impl CreateInventoryItemRequest {
    pub fn into_item(self) -> InventoryItem {
        InventoryItem {
            id: IngredientId::new(),
            name: self.name,
            quantity: self.quantity,
            reorder_level: self.reorder_level,
            unit: self.unit,
            price: self.price,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RestockRequest {
    pub amount: f64,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    #[serde(default)]
    pub orders: Vec<cantina_orders::OrderRequest>,
}
