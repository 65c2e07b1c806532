//! Per-module compile coalescing.
//!
//! At most one compile per entry module runs at a time. A request for a
//! module that is already compiling marks it pending; the running compile
//! picks that up and runs exactly once more when it finishes.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::path::PathBuf;

#[derive(Debug, Default)]
pub struct InFlight {
    /// Running modules → whether another request arrived meanwhile.
    running: Mutex<FxHashMap<PathBuf, bool>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the modules that are idle. Busy ones are marked pending and
    /// left out of the result.
    pub fn claim(&self, modules: &[PathBuf]) -> Vec<PathBuf> {
        let mut running = self.running.lock();
        let mut claimed = Vec::with_capacity(modules.len());
        for module in modules {
            match running.get_mut(module) {
                Some(pending) => *pending = true,
                None => {
                    running.insert(module.clone(), false);
                    claimed.push(module.clone());
                }
            }
        }
        claimed
    }

    /// Finish a compile of `modules`.
    ///
    /// Returns the ones requested again while running; those stay claimed
    /// and must be compiled once more by the caller.
    pub fn release(&self, modules: &[PathBuf]) -> Vec<PathBuf> {
        let mut running = self.running.lock();
        let mut again = Vec::new();
        for module in modules {
            match running.get_mut(module) {
                Some(pending) if *pending => {
                    *pending = false;
                    again.push(module.clone());
                }
                Some(_) => {
                    running.remove(module);
                }
                None => {}
            }
        }
        again
    }

    #[cfg(test)]
    pub fn is_running(&self, module: &std::path::Path) -> bool {
        self.running.lock().contains_key(module)
    }
}
