//! `cantina-observability` — process-wide tracing/logging setup.

pub mod tracing;

/// Initialize observability for the process. Call once, early in `main`.
pub fn init() {
    tracing::init();
}
