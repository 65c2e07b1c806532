//! The set of entry modules a task compiles.

use crate::asset::glob::GlobList;
use crate::config::ConfigError;
use std::path::{Path, PathBuf};

/// Entry modules matched by the configured globs.
///
/// Enumerated once when the task starts. Files created later are not
/// picked up until the process restarts.
#[derive(Debug, Clone)]
pub struct EntrySet {
    root: PathBuf,
    patterns: GlobList,
    modules: Vec<PathBuf>,
}

impl EntrySet {
    /// Expand `patterns` under `root`.
    pub fn enumerate(root: &Path, patterns: &[String]) -> Result<Self, ConfigError> {
        let patterns = GlobList::new(patterns)?;
        let modules = patterns.expand(root);
        Ok(Self {
            root: root.to_path_buf(),
            patterns,
            modules,
        })
    }

    /// Exact path lookup.
    pub fn find(&self, path: &Path) -> Option<&Path> {
        self.modules.iter().find(|m| *m == path).map(PathBuf::as_path)
    }

    /// Whether `path` follows the entry-module naming convention, whether
    /// or not it was present at startup.
    pub fn matches_pattern(&self, path: &Path) -> bool {
        self.patterns.is_match(&self.root, path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.modules.iter()
    }

    pub fn modules(&self) -> &[PathBuf] {
        &self.modules
    }

    pub fn patterns(&self) -> &[String] {
        self.patterns.patterns()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_enumerate_and_find() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let modules = root.join("src/css/modules");
        fs::create_dir_all(&modules).unwrap();
        fs::write(modules.join("app.css"), "").unwrap();
        fs::write(modules.join("admin.css"), "").unwrap();

        let set = EntrySet::enumerate(root, &["src/css/modules/*.css".into()]).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.modules()[0], modules.join("admin.css"));
        assert!(set.find(&modules.join("app.css")).is_some());

        // Conventional name, but created after enumeration
        let late = modules.join("late.css");
        assert!(set.matches_pattern(&late));
        assert!(set.find(&late).is_none());

        assert!(!set.matches_pattern(&root.join("src/css/partials/base.css")));
    }

    #[test]
    fn test_enumerate_rejects_bad_glob() {
        let tmp = TempDir::new().unwrap();
        assert!(EntrySet::enumerate(tmp.path(), &["src/[".into()]).is_err());
    }
}
