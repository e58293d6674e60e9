//! `cantina-inventory` — Inventory Ledger domain types.
//!
//! Stock quantities are only ever changed alongside an append-only
//! `InventoryTransaction` record; the transaction log is the audit trail that
//! reconciles item quantity over time.

mod item;
mod stock;
mod transaction;

pub use item::InventoryItem;
pub use stock::{Shortfall, StockLevels};
pub use transaction::{InventoryTransaction, TransactionReason};
