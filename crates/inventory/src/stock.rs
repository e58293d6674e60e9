//! Pure stock arithmetic over a snapshot of inventory rows.
//!
//! The storage layer locks and reads the relevant rows inside its
//! transaction, builds a [`StockLevels`] view, and lets the order engine do
//! sufficiency checks and tentative debits against the view. Nothing here
//! touches the database.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use cantina_core::IngredientId;

/// Deficit for one ingredient: available stock minus required, when negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shortfall {
    pub ingredient_id: IngredientId,
    #[serde(rename = "inventory_name")]
    pub name: String,
    pub not_enough: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct Level {
    name: String,
    quantity: f64,
}

/// In-memory view of current stock for a set of ingredients.
///
/// Debits are applied to the view as lines are accepted, so later lines in
/// the same order (or later orders in the same batch) observe stock already
/// claimed by earlier ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StockLevels {
    levels: HashMap<IngredientId, Level>,
}

impl StockLevels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ingredient_id: IngredientId, name: impl Into<String>, quantity: f64) {
        self.levels.insert(
            ingredient_id,
            Level {
                name: name.into(),
                quantity,
            },
        );
    }

    pub fn quantity(&self, ingredient_id: &IngredientId) -> Option<f64> {
        self.levels.get(ingredient_id).map(|l| l.quantity)
    }

    pub fn name(&self, ingredient_id: &IngredientId) -> Option<&str> {
        self.levels.get(ingredient_id).map(|l| l.name.as_str())
    }

    /// Check whether `required` units are available, without mutating the view.
    ///
    /// Returns the shortfall when stock is insufficient or the ingredient is
    /// unknown (unknown stock counts as zero).
    pub fn check_sufficiency(
        &self,
        ingredient_id: &IngredientId,
        required: f64,
    ) -> Result<(), Shortfall> {
        let (name, available) = match self.levels.get(ingredient_id) {
            Some(level) => (level.name.clone(), level.quantity),
            None => (String::new(), 0.0),
        };
        if available - required < 0.0 {
            return Err(Shortfall {
                ingredient_id: *ingredient_id,
                name,
                not_enough: required - available,
            });
        }
        Ok(())
    }

    /// Subtract `amount` from the view. The caller must have verified
    /// sufficiency first; the view still never goes negative.
    pub fn debit(&mut self, ingredient_id: &IngredientId, amount: f64) {
        if let Some(level) = self.levels.get_mut(ingredient_id) {
            level.quantity = (level.quantity - amount).max(0.0);
        }
    }

    /// Add `amount` back to the view (e.g. a reservation being released).
    pub fn credit(&mut self, ingredient_id: &IngredientId, amount: f64) {
        if let Some(level) = self.levels.get_mut(ingredient_id) {
            level.quantity += amount;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn milk() -> IngredientId {
        IngredientId::new()
    }

    #[test]
    fn sufficiency_passes_when_stock_covers_requirement() {
        let id = milk();
        let mut stock = StockLevels::new();
        stock.insert(id, "milk", 500.0);
        assert!(stock.check_sufficiency(&id, 500.0).is_ok());
        assert!(stock.check_sufficiency(&id, 499.9).is_ok());
    }

    #[test]
    fn shortfall_reports_exact_deficit() {
        let id = milk();
        let mut stock = StockLevels::new();
        stock.insert(id, "milk", 500.0);

        let shortfall = stock.check_sufficiency(&id, 600.0).unwrap_err();
        assert_eq!(shortfall.ingredient_id, id);
        assert_eq!(shortfall.name, "milk");
        assert!((shortfall.not_enough - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_ingredient_counts_as_zero_stock() {
        let stock = StockLevels::new();
        let id = milk();
        let shortfall = stock.check_sufficiency(&id, 10.0).unwrap_err();
        assert!((shortfall.not_enough - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn credit_restores_debited_stock() {
        let id = milk();
        let mut stock = StockLevels::new();
        stock.insert(id, "milk", 500.0);

        stock.debit(&id, 400.0);
        stock.credit(&id, 400.0);
        assert_eq!(stock.quantity(&id), Some(500.0));
    }

    #[test]
    fn debit_is_visible_to_later_checks() {
        let id = milk();
        let mut stock = StockLevels::new();
        stock.insert(id, "milk", 500.0);

        stock.debit(&id, 400.0);
        assert!(stock.check_sufficiency(&id, 100.0).is_ok());
        assert!(stock.check_sufficiency(&id, 100.1).is_err());
    }

    proptest! {
        /// Property: after a sufficiency-checked debit the view never goes negative.
        #[test]
        fn checked_debits_never_go_negative(
            initial in 0.0f64..10_000.0,
            amounts in prop::collection::vec(0.0f64..1_000.0, 0..20)
        ) {
            let id = IngredientId::new();
            let mut stock = StockLevels::new();
            stock.insert(id, "beans", initial);

            for amount in amounts {
                if stock.check_sufficiency(&id, amount).is_ok() {
                    stock.debit(&id, amount);
                }
                prop_assert!(stock.quantity(&id).unwrap() >= 0.0);
            }
        }
    }
}
