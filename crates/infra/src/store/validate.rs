//! Payload validation shared by both backends.

use cantina_core::DomainError;
use cantina_inventory::InventoryItem;
use cantina_menu::MenuItem;

pub(crate) fn menu_item(item: &MenuItem) -> Result<(), DomainError> {
    if item.name.trim().is_empty() {
        return Err(DomainError::validation("menu item name cannot be empty"));
    }
    if !(item.price >= 0.0) {
        return Err(DomainError::validation("menu item price must be non-negative"));
    }
    if item.ingredients.is_empty() {
        return Err(DomainError::validation(
            "menu item must consume at least one ingredient",
        ));
    }
    if item.ingredients.iter().any(|r| !(r.quantity > 0.0)) {
        return Err(DomainError::validation(
            "ingredient quantities must be positive",
        ));
    }
    Ok(())
}

pub(crate) fn inventory_item(item: &InventoryItem) -> Result<(), DomainError> {
    if item.name.trim().is_empty() {
        return Err(DomainError::validation("inventory item name cannot be empty"));
    }
    if item.unit.trim().is_empty() {
        return Err(DomainError::validation("inventory item unit cannot be empty"));
    }
    if !(item.quantity >= 0.0) {
        return Err(DomainError::validation("quantity must be non-negative"));
    }
    if !(item.reorder_level >= 0.0) {
        return Err(DomainError::validation("reorder level must be non-negative"));
    }
    if !(item.price >= 0.0) {
        return Err(DomainError::validation("price must be non-negative"));
    }
    Ok(())
}

pub(crate) fn restock_amount(amount: f64) -> Result<(), DomainError> {
    if !(amount > 0.0) {
        return Err(DomainError::validation("restock amount must be positive"));
    }
    Ok(())
}
