//! Glob patterns over project-relative paths.
//!
//! Patterns are written relative to the project root (`src/css/modules/*.css`)
//! and always matched against root-relative, forward-slash paths. `*` stops
//! at `/`; use `**` to cross directories.

use crate::config::ConfigError;
use crate::utils::path::to_slash;
use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use jwalk::WalkDir;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Compile one pattern. A leading `./` is ignored.
pub fn build_glob(pattern: &str) -> Result<Glob, ConfigError> {
    let trimmed = pattern.strip_prefix("./").unwrap_or(pattern);
    GlobBuilder::new(trimmed)
        .literal_separator(true)
        .build()
        .map_err(|e| ConfigError::Glob {
            pattern: pattern.to_string(),
            message: e.kind().to_string(),
        })
}

/// A compiled list of patterns, matching when any one matches.
#[derive(Debug, Clone)]
pub struct GlobList {
    set: GlobSet,
    patterns: Vec<String>,
}

impl GlobList {
    pub fn new(patterns: &[String]) -> Result<Self, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            builder.add(build_glob(pattern)?);
        }
        let set = builder.build().map_err(|e| ConfigError::Glob {
            pattern: patterns.join(", "),
            message: e.kind().to_string(),
        })?;
        Ok(Self {
            set,
            patterns: patterns.to_vec(),
        })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Match an absolute path under `root` (or an already relative one).
    ///
    /// Absolute paths outside `root` never match.
    pub fn is_match(&self, root: &Path, path: &Path) -> bool {
        let rel = match path.strip_prefix(root) {
            Ok(rel) => rel,
            Err(_) if path.is_relative() => path,
            Err(_) => return false,
        };
        self.set.is_match(to_slash(rel))
    }

    /// Directories that can contain matches: the literal prefix of each
    /// pattern, with nested duplicates removed.
    pub fn base_dirs(&self, root: &Path) -> Vec<PathBuf> {
        let prefixes: BTreeSet<PathBuf> = self
            .patterns
            .iter()
            .map(|p| literal_prefix(p.strip_prefix("./").unwrap_or(p)))
            .collect();

        let mut bases: Vec<PathBuf> = Vec::new();
        for prefix in prefixes {
            if !bases.iter().any(|b| prefix.starts_with(b)) {
                bases.push(prefix);
            }
        }
        bases.into_iter().map(|b| root.join(b)).collect()
    }

    /// Deepest directory holding every base dir; `root` when the patterns
    /// share nothing.
    pub fn common_base(&self, root: &Path) -> PathBuf {
        let mut bases = self.base_dirs(root).into_iter();
        let Some(mut common) = bases.next() else {
            return root.to_path_buf();
        };
        for base in bases {
            while !base.starts_with(&common) {
                if !common.pop() {
                    break;
                }
            }
        }
        common
    }

    /// Every existing file under `root` matching the list, sorted and
    /// without duplicates.
    pub fn expand(&self, root: &Path) -> Vec<PathBuf> {
        let mut found = BTreeSet::new();
        for base in self.base_dirs(root) {
            if base.is_file() {
                if self.is_match(root, &base) {
                    found.insert(base);
                }
                continue;
            }
            if !base.is_dir() {
                continue;
            }
            let files = WalkDir::new(&base)
                .sort(true)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file())
                .map(|e| e.path())
                .filter(|p| self.is_match(root, p));
            found.extend(files);
        }
        found.into_iter().collect()
    }
}

/// Leading components free of glob metacharacters.
///
/// `src/css/modules/*.css` -> `src/css/modules`, `src/a.css` -> `src`.
fn literal_prefix(pattern: &str) -> PathBuf {
    let parts: Vec<&str> = pattern.split('/').collect();
    let literal = parts
        .iter()
        .take_while(|part| !part.contains(['*', '?', '[', '{']))
        .count();
    // A fully literal pattern names a file; walk its parent.
    let take = if literal == parts.len() { literal.saturating_sub(1) } else { literal };
    parts[..take].iter().collect()
}
