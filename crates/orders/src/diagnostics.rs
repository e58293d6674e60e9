//! Per-line diagnostics surfaced to the caller when an order is rejected.
//!
//! Rejections are built as a fresh list of annotated lines; the submitted
//! request is never mutated in place.

use serde::{Deserialize, Serialize};

use cantina_core::ProductId;
use cantina_inventory::Shortfall;

/// Warning tag attached to a single failing line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemWarning {
    #[serde(rename = "not found in menu")]
    NotFoundInMenu,
    #[serde(rename = "not enough in inventory")]
    NotEnoughInInventory,
    #[serde(rename = "found allergen")]
    FoundAllergen,
    #[serde(rename = "duplicated")]
    Duplicated,
    #[serde(rename = "zero quantity")]
    ZeroQuantity,
}

/// One annotated line in a rejection response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDiagnostic {
    pub product_id: ProductId,
    pub quantity: u64,
    #[serde(rename = "error", skip_serializing_if = "Option::is_none")]
    pub warning: Option<ItemWarning>,
    /// Allergens present both on the menu item and in the order's declared
    /// list; only populated for `found allergen` lines.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allergens: Vec<String>,
    /// Exact per-ingredient deficits; only populated for
    /// `not enough in inventory` lines.
    #[serde(default, rename = "not_enough", skip_serializing_if = "Vec::is_empty")]
    pub shortfalls: Vec<Shortfall>,
}

impl ItemDiagnostic {
    pub fn clean(product_id: ProductId, quantity: u64) -> Self {
        Self {
            product_id,
            quantity,
            warning: None,
            allergens: Vec::new(),
            shortfalls: Vec::new(),
        }
    }

    pub fn tagged(product_id: ProductId, quantity: u64, warning: ItemWarning) -> Self {
        Self {
            warning: Some(warning),
            ..Self::clean(product_id, quantity)
        }
    }
}

/// Why a whole order was rejected.
///
/// Variants are ordered by surfacing priority: when several lines fail for
/// different reasons, the allergen conflict wins, then missing menu items,
/// then insufficient stock. Declaration order drives the derived `Ord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    AllergenConflict,
    MenuItemNotFound,
    InsufficientInventory,
    BadInput,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::AllergenConflict => "allergen_conflict",
            RejectReason::MenuItemNotFound => "menu_item_not_found",
            RejectReason::InsufficientInventory => "insufficient_inventory",
            RejectReason::BadInput => "bad_input",
        }
    }
}

impl core::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected order: the winning reason plus the annotated lines.
///
/// For bad input the full submitted list is echoed back (clean lines
/// untagged); for validation failures only the failing lines are included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRejection {
    pub reason: RejectReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ItemDiagnostic>,
}

impl OrderRejection {
    pub fn bad_input(message: impl Into<String>) -> Self {
        Self {
            reason: RejectReason::BadInput,
            message: Some(message.into()),
            items: Vec::new(),
        }
    }

    pub fn with_items(reason: RejectReason, items: Vec<ItemDiagnostic>) -> Self {
        Self {
            reason,
            message: None,
            items,
        }
    }
}
