use std::path::PathBuf;

/// What happened to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }

    /// Only created and modified files can require a rebuild.
    pub fn is_actionable(self) -> bool {
        matches!(self, Self::Created | Self::Modified)
    }
}

/// One debounced change delivered to a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub kind: ChangeKind,
    pub path: PathBuf,
}

/// Debounced file events, sorted by path for stable delivery
pub(super) struct DebouncedEvents(pub(super) Vec<(PathBuf, ChangeKind)>);

impl DebouncedEvents {
    pub(super) fn into_events(self) -> Vec<WatchEvent> {
        self.0
            .into_iter()
            .map(|(path, kind)| WatchEvent { kind, path })
            .collect()
    }
}
