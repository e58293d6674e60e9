use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cantina_core::{CustomerName, OrderId, ProductId};

/// Order status lifecycle.
///
/// `processing → accepted` via close (terminal for edits); deletion is legal
/// from either state. No other transitions exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Processing,
    Accepted,
}

impl OrderStatus {
    /// Item-list edits are only legal while the order is processing.
    pub fn is_editable(&self) -> bool {
        matches!(self, OrderStatus::Processing)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Processing => "processing",
            OrderStatus::Accepted => "accepted",
        }
    }
}

impl core::str::FromStr for OrderStatus {
    type Err = cantina_core::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(OrderStatus::Processing),
            "accepted" => Ok(OrderStatus::Accepted),
            other => Err(cantina_core::DomainError::validation(format!(
                "unknown order status: {other}"
            ))),
        }
    }
}

/// One persisted order line. Product id is unique within an accepted order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub quantity: u64,
}

/// The `Order` aggregate as read back from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "order_id")]
    pub id: OrderId,
    pub customer_name: CustomerName,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allergens: Vec<String>,
    /// Null until the order has been fully validated and reserved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<f64>,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Append-only record of one lifecycle transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub occurred_at: DateTime<Utc>,
}

/// One candidate line as submitted by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRequest {
    pub product_id: ProductId,
    #[serde(default)]
    pub quantity: u64,
}

/// A candidate order as submitted by the client, not yet validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub customer_name: String,
    #[serde(default)]
    pub allergens: Vec<String>,
    #[serde(default)]
    pub items: Vec<ItemRequest>,
}
