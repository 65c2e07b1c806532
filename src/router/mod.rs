//! Rebuild routing: which entry modules does a changed file affect?
//!
//! Decision order, first match wins:
//!
//! | Change                                   | Route       | Rebuild                         |
//! |------------------------------------------|-------------|---------------------------------|
//! | not created/modified                     | `Ignore`    | nothing                         |
//! | other extension, compiler has a template | `Template`  | the template entry (utility.css)|
//! | matches the entry globs, known           | `Module`    | that module                     |
//! | matches the entry globs, unknown         | `Unknown`   | nothing (enumerated at startup) |
//! | anything else                            | `Partial`   | every module referencing it     |
//!
//! Partial detection is textual: entry sources are read fresh on every
//! change and searched for the partial's name. There is no stored graph.

use crate::log;
use crate::task::{Compiler, EntrySet};
use crate::watch::ChangeKind;
use std::path::{Path, PathBuf};
use tokio::task::JoinSet;


/// Where a change leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Ignore,
    /// Non-source change; rebuild the compiler's fixed template entry.
    Template(PathBuf),
    /// A known entry module changed.
    Module(PathBuf),
    /// Looks like an entry module but was not present at startup.
    Unknown(PathBuf),
    /// A partial with this bare name changed.
    Partial(String),
}

/// Route a single change.
pub fn classify<C: Compiler + ?Sized>(
    compiler: &C,
    entries: &EntrySet,
    kind: ChangeKind,
    path: &Path,
) -> Route {
    if !kind.is_actionable() {
        return Route::Ignore;
    }

    let has_ext = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e == compiler.extension());

    if !has_ext && let Some(template) = compiler.template_entry() {
        return Route::Template(template.to_path_buf());
    }

    if entries.matches_pattern(path) {
        return match entries.find(path) {
            Some(module) => Route::Module(module.to_path_buf()),
            None => Route::Unknown(path.to_path_buf()),
        };
    }

    match compiler.partial_name(path) {
        Some(name) => Route::Partial(name),
        None => Route::Ignore,
    }
}

/// Entry modules whose source references `partial`, in entry order.
///
/// Sources are read concurrently. A module that cannot be read is logged
/// and treated as not referencing the partial.
pub async fn dependents<C: Compiler + ?Sized>(
    compiler: &C,
    entries: &EntrySet,
    partial: &str,
) -> Vec<PathBuf> {
    let mut reads = JoinSet::new();
    for (index, module) in entries.iter().cloned().enumerate() {
        reads.spawn(async move {
            let source = tokio::fs::read_to_string(&module).await;
            (index, module, source)
        });
    }

    let mut matched = Vec::new();
    while let Some(joined) = reads.join_next().await {
        match joined {
            Ok((index, module, Ok(source))) => {
                if compiler.references(&source, partial) {
                    matched.push((index, module));
                }
            }
            Ok((_, module, Err(e))) => {
                log!(compiler.name(); "warning: cannot read {}: {}", module.display(), e);
            }
            Err(e) => log!(compiler.name(); "warning: read task failed: {}", e),
        }
    }

    matched.sort_by_key(|(index, _)| *index);
    matched.into_iter().map(|(_, module)| module).collect()
}
