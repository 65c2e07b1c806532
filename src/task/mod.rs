//! Build tasks: one generic orchestrator, one [`Compiler`] per asset kind.
//!
//! ```text
//! Task<CssCompiler>  ──┐
//!                      ├─ EntrySet (enumerated once) ─ router ─ InFlight ─ spawn_blocking(compile)
//! Task<JsCompiler>   ──┘
//! ```
//!
//! Compile failures are logged here and never reach the router or the
//! watcher. Every `compile_*` returns whether all compiles succeeded.

pub mod css;
mod entry;
mod inflight;
pub mod js;


pub use css::CssCompiler;
pub use entry::EntrySet;
pub use inflight::InFlight;
pub use js::JsCompiler;

use crate::asset::glob::GlobList;
use crate::config::PipelineConfig;
use crate::logger;
use crate::router::{self, Route};
use crate::utils::plural::plural_count;
use crate::watch::{ChangeKind, FsWatcher};
use crate::{debug, log};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// What a task needs to know about one asset kind.
pub trait Compiler: Send + Sync + 'static {
    /// Log prefix, e.g. `css`.
    fn name(&self) -> &'static str;

    /// Source extension without the dot.
    fn extension(&self) -> &'static str;

    /// Compile several modules in one call instead of one call each.
    fn batches(&self) -> bool {
        false
    }

    fn compile_one(&self, module: &Path) -> Result<()>;

    fn compile_batch(&self, modules: &[PathBuf]) -> Result<()> {
        for module in modules {
            self.compile_one(module)?;
        }
        Ok(())
    }

    /// Bare name entry sources use to refer to `path`.
    fn partial_name(&self, path: &Path) -> Option<String> {
        path.file_name().map(|n| n.to_string_lossy().into_owned())
    }

    /// Whether `source` references the partial `name`.
    fn references(&self, source: &str, name: &str) -> bool;

    /// Module rebuilt when a watched non-source file changes.
    fn template_entry(&self) -> Option<&Path> {
        None
    }
}

struct Shared<C> {
    compiler: C,
    entries: EntrySet,
    watch: GlobList,
    inflight: InFlight,
    config: Arc<PipelineConfig>,
}

/// Compile orchestration for one asset kind. Cheap to clone.
pub struct Task<C: Compiler> {
    shared: Arc<Shared<C>>,
}

impl<C: Compiler> Clone for Task<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<C: Compiler> Task<C> {
    pub fn new(compiler: C, entries: EntrySet, watch: GlobList, config: Arc<PipelineConfig>) -> Self {
        Self {
            shared: Arc::new(Shared {
                compiler,
                entries,
                watch,
                inflight: InFlight::new(),
                config,
            }),
        }
    }

    pub fn compiler(&self) -> &C {
        &self.shared.compiler
    }

    pub fn entries(&self) -> &EntrySet {
        &self.shared.entries
    }

    fn name(&self) -> &'static str {
        self.shared.compiler.name()
    }

    fn display(&self, path: &Path) -> String {
        self.shared.config.display(path)
    }

    // ========================================================================
    // compiling
    // ========================================================================

    /// Compile a single entry module.
    pub async fn compile_one(&self, module: &Path) -> bool {
        self.compile_guarded(vec![module.to_path_buf()]).await
    }

    /// Compile every entry module. Returns once all were attempted.
    pub async fn compile_all(&self) -> bool {
        let modules = self.entries().modules().to_vec();
        if modules.is_empty() {
            log!(self.name(); "no entry modules match {}", self.entries().patterns().join(", "));
            return true;
        }
        log!(self.name(); "compiling {}", plural_count(modules.len(), "module"));
        self.compile_set(modules).await
    }

    /// Batching compilers get one call for the whole set; others get one
    /// concurrent call per module.
    pub async fn compile_set(&self, modules: Vec<PathBuf>) -> bool {
        if modules.is_empty() {
            return true;
        }
        if self.compiler().batches() {
            return self.compile_guarded(modules).await;
        }

        let mut set = JoinSet::new();
        for module in modules {
            let task = self.clone();
            set.spawn(async move { task.compile_guarded(vec![module]).await });
        }

        let mut ok = true;
        while let Some(joined) = set.join_next().await {
            ok &= joined.unwrap_or_else(|e| {
                log!("error"; "{} compile task failed: {}", self.name(), e);
                false
            });
        }
        ok
    }

    /// Compile the idle subset of `modules`, then recompile whatever was
    /// requested again in the meantime.
    async fn compile_guarded(&self, modules: Vec<PathBuf>) -> bool {
        let inflight = &self.shared.inflight;
        let mut batch = inflight.claim(&modules);
        if batch.len() < modules.len() {
            debug!(self.name(); "{} already compiling, queued", plural_count(modules.len() - batch.len(), "module"));
        }

        let mut ok = true;
        while !batch.is_empty() {
            ok &= self.run_compile(batch.clone()).await;
            batch = inflight.release(&batch);
        }
        ok
    }

    /// One timed compiler call on the blocking pool.
    async fn run_compile(&self, modules: Vec<PathBuf>) -> bool {
        let label = match modules.as_slice() {
            [single] => self.display(single),
            many => plural_count(many.len(), "module"),
        };

        let task = self.clone();
        let start = Instant::now();
        let result = tokio::task::spawn_blocking(move || {
            let compiler = task.compiler();
            if compiler.batches() {
                compiler.compile_batch(&modules)
            } else {
                modules.iter().try_for_each(|m| compiler.compile_one(m))
            }
        })
        .await;

        match result {
            Ok(Ok(())) => {
                logger::timer(&label, start.elapsed());
                true
            }
            Ok(Err(e)) => {
                log!("error"; "{} {} failed: {:#}", self.name(), label, e);
                false
            }
            Err(e) => {
                log!("error"; "{} {} panicked: {}", self.name(), label, e);
                false
            }
        }
    }

    // ========================================================================
    // watching
    // ========================================================================

    /// Route one change and compile what it affects.
    pub async fn handle_event(&self, kind: ChangeKind, path: PathBuf) -> bool {
        let route = router::classify(self.compiler(), self.entries(), kind, &path);
        let shown = self.display(&path);

        match route {
            Route::Ignore => {
                debug!(self.name(); "ignoring {} {}", kind.label(), shown);
                true
            }
            Route::Template(template) => {
                logger::file_event(kind.label(), &shown, "Template changed: rebuilding utility module");
                self.compile_set(vec![template]).await
            }
            Route::Module(module) => {
                logger::file_event(kind.label(), &shown, "Module changed: rebuilding");
                self.compile_set(vec![module]).await
            }
            Route::Unknown(_) => {
                log!(self.name(); "{} is not a known entry module, restart to include it", shown);
                true
            }
            Route::Partial(name) => {
                logger::file_event(kind.label(), &shown, "Partial changed: rebuilding parent modules");
                let parents = router::dependents(self.compiler(), self.entries(), &name).await;
                if parents.is_empty() {
                    debug!(self.name(); "no entry module references {}", name);
                    return true;
                }
                for parent in &parents {
                    logger::file_info(&self.display(parent));
                }
                self.compile_set(parents).await
            }
        }
    }

    /// Initial build, then (when `watch`) rebuild on change until shutdown.
    ///
    /// The watcher attaches before the initial build so nothing edited
    /// during it is missed.
    pub async fn run(self, watch: bool) -> Result<bool> {
        let watcher = if watch {
            let root = self.shared.config.get_root();
            let watcher = FsWatcher::new(root, self.shared.watch.clone())
                .with_context(|| format!("Failed to start {} watcher", self.name()))?;
            Some(watcher)
        } else {
            None
        };

        let ok = self.compile_all().await;

        let Some(watcher) = watcher else {
            return Ok(ok);
        };

        let (events_tx, mut events_rx) = mpsc::channel(64);
        tokio::spawn(watcher.run(events_tx));
        crate::core::set_watching();
        log!("watch"; "{}: watching {}", self.name(), self.shared.watch.patterns().join(", "));

        while let Some(event) = events_rx.recv().await {
            let task = self.clone();
            tokio::spawn(async move {
                task.handle_event(event.kind, event.path).await;
            });
        }
        Ok(ok)
    }
}
