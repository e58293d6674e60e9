//! Batch submission outcome types and aggregation.
//!
//! The storage layer validates each candidate independently inside one
//! shared transaction; this module owns the bookkeeping: per-order outcomes,
//! the cross-order inventory-usage merge, and the summary arithmetic.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use cantina_core::{IngredientId, OrderId};
use cantina_inventory::StockLevels;

use crate::diagnostics::RejectReason;
use crate::engine::Assessment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Accepted,
    Rejected,
}

/// Outcome for one candidate order in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOrderOutcome {
    pub customer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
    pub status: BatchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
}

/// Merged usage of one ingredient across all accepted orders of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryUpdate {
    pub ingredient_id: IngredientId,
    pub name: String,
    pub quantity_used: f64,
    pub remaining: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_orders: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub total_revenue: f64,
    pub inventory_updates: Vec<InventoryUpdate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub processed_orders: Vec<BatchOrderOutcome>,
    pub summary: BatchSummary,
}

/// Running batch state while candidates are processed in submission order.
#[derive(Debug, Default)]
pub struct BatchAccumulator {
    outcomes: Vec<BatchOrderOutcome>,
    accepted: u64,
    rejected: u64,
    total_revenue: f64,
    used: HashMap<IngredientId, f64>,
}

impl BatchAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_accepted(&mut self, order_id: OrderId, assessment: &Assessment) {
        self.accepted += 1;
        self.total_revenue += assessment.total;
        for (ingredient_id, amount) in &assessment.consumption {
            *self.used.entry(*ingredient_id).or_default() += amount;
        }
        self.outcomes.push(BatchOrderOutcome {
            customer_name: assessment.customer_name.as_str().to_string(),
            order_id: Some(order_id),
            status: BatchStatus::Accepted,
            reason: None,
            total: Some(assessment.total),
        });
    }

    pub fn record_rejected(&mut self, customer_name: &str, reason: RejectReason) {
        self.rejected += 1;
        self.outcomes.push(BatchOrderOutcome {
            customer_name: customer_name.to_string(),
            order_id: None,
            status: BatchStatus::Rejected,
            reason: Some(reason),
            total: None,
        });
    }

    /// Finalize against the post-batch stock view (names and remaining
    /// quantities come from it). Updates are sorted by ingredient name for a
    /// stable response shape.
    pub fn finish(self, stock_after: &StockLevels) -> BatchOutcome {
        let mut inventory_updates: Vec<InventoryUpdate> = self
            .used
            .into_iter()
            .map(|(ingredient_id, quantity_used)| InventoryUpdate {
                ingredient_id,
                name: stock_after
                    .name(&ingredient_id)
                    .unwrap_or_default()
                    .to_string(),
                quantity_used,
                remaining: stock_after.quantity(&ingredient_id).unwrap_or(0.0),
            })
            .collect();
        inventory_updates.sort_by(|a, b| a.name.cmp(&b.name));

        BatchOutcome {
            summary: BatchSummary {
                total_orders: self.accepted + self.rejected,
                accepted: self.accepted,
                rejected: self.rejected,
                total_revenue: self.total_revenue,
                inventory_updates,
            },
            processed_orders: self.outcomes,
        }
    }
}
