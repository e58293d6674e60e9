//! `cantina-infra` — storage for the order engine and its collaborators.
//!
//! The engine itself ([`cantina_orders::engine`]) is pure; this crate owns
//! every transaction boundary. Two interchangeable backends implement the
//! store traits: `PgOrderStore` (sqlx/Postgres, row locks, repeatable-read
//! batches) and `InMemoryOrderStore` (mutex-guarded maps, used by API tests).

pub mod error;
pub mod store;

pub use error::StoreError;
pub use store::in_memory::InMemoryOrderStore;
pub use store::postgres::PgOrderStore;
pub use store::{InventoryStore, MenuStore, OrderStore};
