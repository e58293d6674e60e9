use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cantina_core::{IngredientId, OrderId};

/// Why a stock quantity changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionReason {
    /// Stock added by a supplier delivery or manual top-up.
    Restock,
    /// Stock consumed by an accepted order.
    Usage,
    /// Stock credited back when a processing order was deleted.
    Cancelled,
    /// Stock credited back when an order's item list was replaced.
    Annul,
}

impl TransactionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionReason::Restock => "restock",
            TransactionReason::Usage => "usage",
            TransactionReason::Cancelled => "cancelled",
            TransactionReason::Annul => "annul",
        }
    }
}

impl core::fmt::Display for TransactionReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for TransactionReason {
    type Err = cantina_core::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "restock" => Ok(TransactionReason::Restock),
            "usage" => Ok(TransactionReason::Usage),
            "cancelled" => Ok(TransactionReason::Cancelled),
            "annul" => Ok(TransactionReason::Annul),
            other => Err(cantina_core::DomainError::validation(format!(
                "unknown transaction reason: {other}"
            ))),
        }
    }
}

/// One append-only stock movement.
///
/// Never updated or deleted once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryTransaction {
    pub id: Uuid,
    pub ingredient_id: IngredientId,
    /// Signed change: positive for restock/credit, negative for usage.
    pub quantity_change: f64,
    pub reason: TransactionReason,
    /// Order the movement belongs to; absent for restocks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
    pub occurred_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_round_trips_through_str() {
        for reason in [
            TransactionReason::Restock,
            TransactionReason::Usage,
            TransactionReason::Cancelled,
            TransactionReason::Annul,
        ] {
            let parsed: TransactionReason = reason.as_str().parse().unwrap();
            assert_eq!(parsed, reason);
        }
    }

    #[test]
    fn unknown_reason_is_rejected() {
        assert!("refund".parse::<TransactionReason>().is_err());
    }

    #[test]
    fn reason_serializes_lowercase() {
        let json = serde_json::to_string(&TransactionReason::Usage).unwrap();
        assert_eq!(json, r#""usage""#);
    }
}
