use serde::{Deserialize, Serialize};

use cantina_core::IngredientId;

/// A stocked ingredient.
///
/// `quantity` is float-capable for fractional units (ml, g). It must never be
/// mutated outside an [`crate::InventoryTransaction`] record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    #[serde(rename = "ingredient_id")]
    pub id: IngredientId,
    pub name: String,
    pub quantity: f64,
    pub reorder_level: f64,
    pub unit: String,
    pub price: f64,
}

impl InventoryItem {
    /// True when current stock has fallen to or below the reorder threshold.
    pub fn needs_reorder(&self) -> bool {
        self.quantity <= self.reorder_level
    }
}
