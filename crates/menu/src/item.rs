use serde::{Deserialize, Serialize};

use cantina_core::{IngredientId, ProductId};

/// One ingredient a menu item consumes, per ordered unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IngredientRequirement {
    pub ingredient_id: IngredientId,
    /// Quantity consumed per single ordered unit (fractional units allowed).
    pub quantity: f64,
}

/// A sellable menu item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub allergens: Vec<String>,
    pub price: f64,
    pub ingredients: Vec<IngredientRequirement>,
}

/// The slice of a menu item the order engine needs: price, declared
/// allergens, and ingredient composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    pub price: f64,
    pub allergens: Vec<String>,
    pub ingredients: Vec<IngredientRequirement>,
}

impl Composition {
    /// Case-insensitive intersection with an order's declared allergen list.
    pub fn conflicting_allergens(&self, declared: &[String]) -> Vec<String> {
        self.allergens
            .iter()
            .filter(|a| declared.iter().any(|d| d.eq_ignore_ascii_case(a)))
            .cloned()
            .collect()
    }
}

impl From<&MenuItem> for Composition {
    fn from(item: &MenuItem) -> Self {
        Self {
            price: item.price,
            allergens: item.allergens.clone(),
            ingredients: item.ingredients.clone(),
        }
    }
}
