//! Order operation errors.

use thiserror::Error;

use cantina_core::DomainError;

use crate::diagnostics::OrderRejection;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum OrderError {
    /// A business-rule rejection; no side effects were committed.
    #[error("order rejected: {}", .0.reason)]
    Rejected(OrderRejection),

    /// The order id does not exist.
    #[error("order not found")]
    NotFound,

    /// Mutating an order that already left the `processing` state.
    #[error("order is already closed")]
    AlreadyClosed,

    /// Domain-level failure outside the rejection taxonomy (e.g. bad id).
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<OrderRejection> for OrderError {
    fn from(rejection: OrderRejection) -> Self {
        Self::Rejected(rejection)
    }
}
