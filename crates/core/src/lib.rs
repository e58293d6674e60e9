//! `cantina-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod name;

pub use error::DomainError;
pub use id::{IngredientId, OrderId, ProductId};
pub use name::CustomerName;
