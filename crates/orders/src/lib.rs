//! `cantina-orders` — Order Lifecycle Manager domain core.
//!
//! This crate holds the `Order` aggregate, per-line diagnostics, and the pure
//! validation/assessment engine. The engine never performs I/O: the storage
//! layer reads menu compositions and locks stock inside its own transaction,
//! then hands the engine plain maps and a [`cantina_inventory::StockLevels`]
//! view to decide against.

pub mod batch;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod order;

pub use batch::{
    BatchAccumulator, BatchOrderOutcome, BatchOutcome, BatchStatus, BatchSummary, InventoryUpdate,
};
pub use diagnostics::{ItemDiagnostic, ItemWarning, OrderRejection, RejectReason};
pub use engine::{assess, check_shape, Assessment};
pub use error::OrderError;
pub use order::{ItemRequest, Order, OrderItem, OrderRequest, OrderStatus, StatusChange};
