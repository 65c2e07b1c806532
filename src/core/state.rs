//! Process state for watch mode.
//!
//! - `WATCHING`: have the watchers started? (initial build complete)
//! - `SHUTDOWN`: has shutdown been requested? (Ctrl+C received)

use std::sync::atomic::{AtomicBool, Ordering};

/// Watchers are running (initial build finished in development mode)
static WATCHING: AtomicBool = AtomicBool::new(false);

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

// =============================================================================
// WATCHING state
// =============================================================================

pub fn is_watching() -> bool {
    WATCHING.load(Ordering::SeqCst)
}

/// Mark watchers as started (call once they are attached)
pub fn set_watching() {
    WATCHING.store(true, Ordering::SeqCst);
}

// =============================================================================
// SHUTDOWN state
// =============================================================================

/// Setup the global Ctrl+C handler. Call once at program start
///
/// Watchers never finish on their own, so the handler exits the process
/// directly. Output already written stays on disk.
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);

        if is_watching() {
            crate::log!("watch"; "stopping watchers...");
        }
        std::process::exit(0);
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}
