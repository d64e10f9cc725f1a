//! Process-wide switch for verbose routing diagnostics.
//!
//! The flag follows the `enable_debug_logs` setting and is refreshed every
//! time settings are loaded. When it is off, [`debug_event`] is a no-op.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

static DEBUG_LOGS: AtomicBool = AtomicBool::new(false);

pub fn set_debug_logs(enabled: bool) {
    DEBUG_LOGS.store(enabled, Ordering::Relaxed);
}

pub fn debug_logs_enabled() -> bool {
    DEBUG_LOGS.load(Ordering::Relaxed)
}

/// Emit a structured diagnostic event on the `beeline::debug` target.
pub fn debug_event(event: &str, data: serde_json::Value) {
    if !debug_logs_enabled() {
        return;
    }
    info!(target: "beeline::debug", event, data = %data);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggles() {
        set_debug_logs(true);
        assert!(debug_logs_enabled());
        debug_event("test.event", serde_json::json!({"k": 1}));
        set_debug_logs(false);
        assert!(!debug_logs_enabled());
    }
}
