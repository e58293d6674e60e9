//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Initialize tracing for the process.
///
/// Filtering comes from `RUST_LOG` (default `info`, with sqlx statement
/// logging capped at `warn`). Output is JSON unless `CANTINA_LOG_FORMAT=text`
/// asks for the human-readable form. Safe to call multiple times; subsequent
/// calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    let text = std::env::var("CANTINA_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("text"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if text {
        let _ = builder.compact().try_init();
    } else {
        let _ = builder
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .try_init();
    }
}
