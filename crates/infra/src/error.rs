//! Storage error model.
//!
//! Business-rule failures keep their [`OrderError`] shape so the HTTP layer
//! can map them precisely; everything else (connection faults, constraint
//! violations, rollback failures) is an infrastructure error surfaced as a
//! generic server fault.

use thiserror::Error;

use cantina_core::DomainError;
use cantina_orders::OrderError;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Deterministic business-rule failure; the transaction was rolled back
    /// and no state changed.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// Domain validation failure outside the order taxonomy (collaborator
    /// CRUD: bad menu/inventory payloads, unknown ids).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Database fault; the whole operation was aborted.
    #[error("storage failure: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<cantina_orders::OrderRejection> for StoreError {
    fn from(rejection: cantina_orders::OrderRejection) -> Self {
        Self::Order(OrderError::Rejected(rejection))
    }
}
