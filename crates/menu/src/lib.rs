//! `cantina-menu` — Menu Catalog types.
//!
//! The order engine *consumes* the catalog but never owns or mutates it:
//! a menu item maps to its ingredient composition (inventory id → quantity
//! required per unit) and its declared allergens.

mod item;

pub use item::{Composition, IngredientRequirement, MenuItem};
