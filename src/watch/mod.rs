//! Filesystem watcher feeding debounced changes to a build task.
//!
//! Architecture:
//! ```text
//! notify → Debouncer (pure timing) → EventClassifier (globs, existence) → WatchEvent
//! ```
//!
//! The watcher is created before the initial build so changes made while
//! it runs are buffered rather than lost.

use std::path::{Path, PathBuf};

use notify::RecommendedWatcher;
use tokio::sync::mpsc;

use crate::asset::glob::GlobList;

// Shared event types.
mod types;
// Pure timing and deduplication.
mod debouncer;
// Existence correction and glob filtering.
mod classifier;
// Watch root attach/re-attach lifecycle.
mod watch_roots;

#[cfg(test)]
mod tests;

pub use types::{ChangeKind, WatchEvent};

use classifier::EventClassifier;
use debouncer::Debouncer;
use watch_roots::WatchRoots;

/// Watches the base directories of a glob list.
pub struct FsWatcher {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    watcher: RecommendedWatcher,
    watch_roots: WatchRoots,
    debouncer: Debouncer,
    root: PathBuf,
    filter: GlobList,
}

impl FsWatcher {
    /// Start watching immediately; events buffer until [`FsWatcher::run`].
    pub fn new(root: &Path, filter: GlobList) -> notify::Result<Self> {
        // Create sync channel for notify (it doesn't support async)
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        let mut watch_roots = WatchRoots::new(filter.base_dirs(root));
        watch_roots.attach_existing(&mut watcher)?;
        crate::debug!("watch"; "attached {} roots for {}", watch_roots.attached_count(), filter.patterns().join(", "));

        Ok(Self {
            notify_rx,
            watcher,
            watch_roots,
            debouncer: Debouncer::new(),
            root: root.to_path_buf(),
            filter,
        })
    }

    /// Forward debounced, classified events until the receiver goes away.
    pub async fn run(self, events_tx: mpsc::Sender<WatchEvent>) {
        let notify_rx = self.notify_rx;
        let mut debouncer = self.debouncer;
        let mut watcher = self.watcher;
        let mut watch_roots = self.watch_roots;
        let root = self.root;
        let filter = self.filter;

        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        // Poll notify events on a plain thread and hand them to the async side
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break; // Receiver dropped
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        loop {
            tokio::select! {
                biased;
                Some(event) = async_rx.recv() => debouncer.add_event(&event),
                _ = tokio::time::sleep(debouncer.sleep_duration()) => {
                    if crate::core::is_shutdown() {
                        break;
                    }
                    watch_roots.maintain(&mut watcher);
                    if forward_changes(&mut debouncer, &root, &filter, &events_tx).await.is_err() {
                        break;
                    }
                }
            }
        }
    }
}

/// Classify ready changes and send them on.
///
/// Returns `Err(())` once the receiving task has shut down.
async fn forward_changes(
    debouncer: &mut Debouncer,
    root: &Path,
    filter: &GlobList,
    events_tx: &mpsc::Sender<WatchEvent>,
) -> Result<(), ()> {
    let Some(raw) = debouncer.take_if_ready() else {
        return Ok(());
    };

    let Some(events) = EventClassifier::classify(raw, root, filter) else {
        return Ok(());
    };

    for event in events.into_events() {
        crate::debug!("watch"; "{}: {}", event.kind.label(), event.path.display());
        events_tx.send(event).await.map_err(|_| ())?;
    }
    Ok(())
}
