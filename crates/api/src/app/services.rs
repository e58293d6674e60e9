//! Store wiring shared by every handler.

use std::sync::Arc;

use cantina_infra::{InMemoryOrderStore, InventoryStore, MenuStore, OrderStore, PgOrderStore};

/// Handles to the storage backend, injected via `Extension`.
///
/// One concrete store implements all three traits; holding them as separate
/// trait objects keeps handlers tied to the seam, not the backend.
pub struct AppServices {
    pub orders: Arc<dyn OrderStore>,
    pub menu: Arc<dyn MenuStore>,
    pub inventory: Arc<dyn InventoryStore>,
}

impl AppServices {
    pub fn postgres(store: PgOrderStore) -> Self {
        let store = Arc::new(store);
        Self {
            orders: store.clone(),
            menu: store.clone(),
            inventory: store,
        }
    }

    /// Backend used by the black-box tests and database-less local runs.
    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryOrderStore::new());
        Self {
            orders: store.clone(),
            menu: store.clone(),
            inventory: store,
        }
    }
}
