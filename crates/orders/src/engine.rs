//! Pure order validation and reservation arithmetic.
//!
//! [`assess`] implements the whole per-order algorithm: shape checks, menu
//! lookup, allergen intersection, sufficiency checks with per-ingredient
//! shortfalls, batched consumption and total computation. It works entirely
//! on data the storage layer already fetched, so a failed assessment can
//! never leave partial state anywhere.

use std::collections::HashMap;

use cantina_core::{CustomerName, IngredientId, ProductId};
use cantina_inventory::{Shortfall, StockLevels};
use cantina_menu::Composition;

use crate::diagnostics::{ItemDiagnostic, ItemWarning, OrderRejection, RejectReason};
use crate::order::{OrderItem, OrderRequest};

/// The outcome of a fully successful validation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub customer_name: CustomerName,
    pub items: Vec<OrderItem>,
    /// Σ(menu price × quantity) across all lines.
    pub total: f64,
    /// Per-ingredient debit, merged across lines that share an ingredient.
    pub consumption: HashMap<IngredientId, f64>,
}

impl Assessment {
    /// Debit the reserved quantities from a stock view, making them visible
    /// to subsequent assessments in the same transaction (batch submission).
    pub fn apply_to(&self, stock: &mut StockLevels) {
        for (ingredient_id, amount) in &self.consumption {
            stock.debit(ingredient_id, *amount);
        }
    }
}

/// Structural validation: customer name, non-empty item list, duplicate
/// product ids, zero-quantity lines. Runs before any inventory is touched.
///
/// On duplicate/zero-quantity failures the *full* item list is echoed back,
/// with only the offending lines tagged.
pub fn check_shape(request: &OrderRequest) -> Result<CustomerName, OrderRejection> {
    let name = CustomerName::parse(request.customer_name.clone())
        .map_err(|e| OrderRejection::bad_input(e.to_string()))?;

    if request.items.is_empty() {
        return Err(OrderRejection::bad_input("order has no items"));
    }

    let mut annotated: Vec<ItemDiagnostic> = Vec::with_capacity(request.items.len());
    let mut seen: HashMap<ProductId, usize> = HashMap::new();
    let mut malformed = false;

    for (idx, item) in request.items.iter().enumerate() {
        let mut diag = ItemDiagnostic::clean(item.product_id, item.quantity);
        if item.quantity == 0 {
            diag.warning = Some(ItemWarning::ZeroQuantity);
            malformed = true;
        } else if let Some(&first) = seen.get(&item.product_id) {
            // Both occurrences are tagged so the caller sees the whole pair,
            // without clobbering a warning the first line already carries.
            if annotated[first].warning.is_none() {
                annotated[first].warning = Some(ItemWarning::Duplicated);
            }
            diag.warning = Some(ItemWarning::Duplicated);
            malformed = true;
        }
        seen.insert(item.product_id, idx);
        annotated.push(diag);
    }

    if malformed {
        return Err(OrderRejection::with_items(RejectReason::BadInput, annotated));
    }
    Ok(name)
}

/// Validate every line against the catalog and a stock view.
///
/// `compositions` holds the menu data for each referenced product (missing
/// key ⇒ not on the menu). `stock` is the snapshot the storage layer locked;
/// it is read, never mutated — call [`Assessment::apply_to`] once the
/// reservation is actually committed.
///
/// Per line, checks run in fixed order: menu lookup, allergen intersection,
/// ingredient sufficiency. When lines fail for different reasons the
/// surfaced whole-order reason follows the priority allergen conflict >
/// item not found > insufficient inventory, and only failing lines are
/// returned.
pub fn assess(
    request: &OrderRequest,
    compositions: &HashMap<ProductId, Composition>,
    stock: &StockLevels,
) -> Result<Assessment, OrderRejection> {
    let customer_name = check_shape(request)?;

    let mut failing: Vec<ItemDiagnostic> = Vec::new();
    let mut accepted: Vec<OrderItem> = Vec::new();
    let mut consumption: HashMap<IngredientId, f64> = HashMap::new();
    let mut total = 0.0;

    for line in &request.items {
        let Some(comp) = compositions.get(&line.product_id) else {
            failing.push(ItemDiagnostic::tagged(
                line.product_id,
                line.quantity,
                ItemWarning::NotFoundInMenu,
            ));
            continue;
        };

        // Allergen conflicts win over stock problems: a conflicting line is
        // never checked against inventory.
        let conflicts = comp.conflicting_allergens(&request.allergens);
        if !conflicts.is_empty() {
            let mut diag = ItemDiagnostic::tagged(
                line.product_id,
                line.quantity,
                ItemWarning::FoundAllergen,
            );
            diag.allergens = conflicts;
            failing.push(diag);
            continue;
        }

        let shortfalls = line_shortfalls(comp, line.quantity, stock, &consumption);
        if !shortfalls.is_empty() {
            let mut diag = ItemDiagnostic::tagged(
                line.product_id,
                line.quantity,
                ItemWarning::NotEnoughInInventory,
            );
            diag.shortfalls = shortfalls;
            failing.push(diag);
            continue;
        }

        for req in &comp.ingredients {
            *consumption.entry(req.ingredient_id).or_default() +=
                req.quantity * line.quantity as f64;
        }
        total += comp.price * line.quantity as f64;
        accepted.push(OrderItem {
            product_id: line.product_id,
            quantity: line.quantity,
        });
    }

    if !failing.is_empty() {
        let reason = failing
            .iter()
            .filter_map(|d| d.warning.map(reason_for))
            .min()
            .unwrap_or(RejectReason::BadInput);
        return Err(OrderRejection::with_items(reason, failing));
    }

    Ok(Assessment {
        customer_name,
        items: accepted,
        total,
        consumption,
    })
}

/// Stock deficits for one line, accounting for what earlier lines of the
/// same order already claimed.
fn line_shortfalls(
    comp: &Composition,
    quantity: u64,
    stock: &StockLevels,
    claimed: &HashMap<IngredientId, f64>,
) -> Vec<Shortfall> {
    let mut shortfalls = Vec::new();
    for req in &comp.ingredients {
        let required = req.quantity * quantity as f64;
        let already = claimed.get(&req.ingredient_id).copied().unwrap_or(0.0);
        // Earlier claims raise the effective requirement; the reported
        // deficit is what the whole order is missing for this ingredient.
        if let Err(shortfall) = stock.check_sufficiency(&req.ingredient_id, required + already) {
            shortfalls.push(shortfall);
        }
    }
    shortfalls
}

fn reason_for(warning: ItemWarning) -> RejectReason {
    match warning {
        ItemWarning::FoundAllergen => RejectReason::AllergenConflict,
        ItemWarning::NotFoundInMenu => RejectReason::MenuItemNotFound,
        ItemWarning::NotEnoughInInventory => RejectReason::InsufficientInventory,
        ItemWarning::Duplicated | ItemWarning::ZeroQuantity => RejectReason::BadInput,
    }
}
