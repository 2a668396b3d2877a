//! Tracing setup for the server.
//!
//! The subscriber starts at `info` (or `RUST_LOG`) so schema compilation
//! and route mounting are logged before the config file is read. Once
//! `[logging] level` is known, `apply_logging_level` swaps the filter in
//! place through a reload handle. `RUST_LOG` always wins over the config.
use std::sync::OnceLock;
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

static LOG_RELOAD_HANDLE: OnceLock<reload::Handle<EnvFilter, tracing_subscriber::Registry>> =
    OnceLock::new();

const FALLBACK_LEVEL: &str = "info";

pub fn init_tracing() {
    init_tracing_with_level(FALLBACK_LEVEL);
}

pub fn init_tracing_with_level(level: &str) {
    let base_filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|_| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| filter_for(level));

    let (reload_layer, handle) = reload::Layer::new(base_filter);
    let _ = LOG_RELOAD_HANDLE.set(handle);

    let _ = tracing_subscriber::registry()
        .with(reload_layer)
        .with(fmt::layer())
        .try_init();
}

/// Parses a configured level or directive list such as
/// `info,restql_schema=debug`. Unparsable input falls back to `info`.
pub fn filter_for(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|err| {
        tracing::warn!(level, error = %err, "Invalid logging level, using info");
        EnvFilter::new(FALLBACK_LEVEL)
    })
}

/// Switches the running subscriber to the configured level.
///
/// Returns `false` when nothing changed: `RUST_LOG` is set or tracing was
/// never initialized.
pub fn apply_logging_level(level: &str) -> bool {
    if std::env::var_os("RUST_LOG").is_some() {
        return false;
    }
    let Some(handle) = LOG_RELOAD_HANDLE.get() else {
        return false;
    };
    let applied = handle.modify(|f| *f = filter_for(level)).is_ok();
    if applied {
        tracing::debug!(level, "Logging level applied");
    }
    applied
}
