//! JS entry modules through an external bundler (esbuild by default).
//!
//! All modules of one request go to the bundler in a single call:
//!
//! ```text
//! esbuild <entries...> --bundle --outdir=<dist> --outbase=<modules base>
//!     --target=<target> --sourcemap[=inline] [--minify] <args...>
//! ```
//!
//! `--outbase` is pinned to the literal base of `js.modules`, so a rebuild
//! of one nested entry lands where the full build put it.

use super::Compiler;
use crate::asset::glob::GlobList;
use crate::config::{ConfigError, PipelineConfig};
use crate::utils::exec::{Cmd, FilterRule};
use anyhow::{Result, anyhow};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

/// esbuild's closing summary line.
const ESBUILD_FILTER: FilterRule = FilterRule::new(&["⚡ Done"]);

/// Specifier of every static `import` statement.
///
/// Matches `import x from './a.js'`, `import { a, b } from "./a"` (across
/// lines), bare `import './side-effect.js'`, and statements following a
/// `;` on the same line.
static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)(?:^|;)[ \t]*import[ \t\r\n]*(?:[^'";]*?[ \t\r\n}*]from[ \t\r\n]*)?['"]([^'"]+)['"]"#)
        .unwrap()
});

pub struct JsCompiler {
    config: Arc<PipelineConfig>,
    outbase: PathBuf,
}

impl JsCompiler {
    pub fn new(config: Arc<PipelineConfig>) -> Result<Self, ConfigError> {
        let outbase = GlobList::new(&config.js.modules)?.common_base(config.get_root());
        Ok(Self { config, outbase })
    }

    /// Bundler invocation for `modules`, entries given root-relative.
    pub fn command(&self, modules: &[PathBuf]) -> Cmd {
        let config = &self.config;
        let js = &config.js;
        let mode = config.mode;
        let minify = mode.optimize && js.minify;

        let entries: Vec<String> = modules.iter().map(|m| config.display(m)).collect();
        let outdir = config.display(&js.dist);
        let outbase = match config.display(&self.outbase) {
            base if base.is_empty() => ".".to_string(),
            base => base,
        };
        let (sourcemap, map_kind) = if mode.inline_source_maps {
            ("--sourcemap=inline", "inline")
        } else {
            ("--sourcemap", "external")
        };

        let mut cmd = Cmd::from_slice(&js.bundler)
            .args(&entries)
            .arg("--bundle")
            .arg(format!("--outdir={outdir}"))
            .arg(format!("--outbase={outbase}"))
            .arg(format!("--target={}", js.target))
            .arg(sourcemap);
        if minify {
            cmd = cmd.arg("--minify");
        }
        cmd.args(&js.args)
            .envs([
                ("ASSETPIPE_ENTRIES", entries.join(",")),
                ("ASSETPIPE_OUTDIR", outdir),
                ("ASSETPIPE_OUTBASE", outbase),
                ("ASSETPIPE_TARGET", js.target.clone()),
                ("ASSETPIPE_SOURCEMAP", map_kind.to_string()),
                ("ASSETPIPE_MINIFY", minify.to_string()),
                ("ASSETPIPE_MODE", mode.name().to_string()),
            ])
            .cwd(config.get_root())
            .label("js")
            .filter(&ESBUILD_FILTER)
    }
}

impl Compiler for JsCompiler {
    fn name(&self) -> &'static str {
        "js"
    }

    fn extension(&self) -> &'static str {
        "js"
    }

    fn batches(&self) -> bool {
        true
    }

    fn compile_one(&self, module: &Path) -> Result<()> {
        self.compile_batch(&[module.to_path_buf()])
    }

    fn compile_batch(&self, modules: &[PathBuf]) -> Result<()> {
        let cmd = self.command(modules);
        crate::debug!("js"; "{}", cmd.display());

        match cmd.run() {
            Ok(_) => Ok(()),
            Err(e) if self.config.js.verbose_errors => Err(e),
            Err(e) => Err(anyhow!("{}", first_error_line(&format!("{e:#}")))),
        }
    }

    /// `utils.js` is imported as `./utils` or `./utils.js`.
    fn partial_name(&self, path: &Path) -> Option<String> {
        let name = path.file_name()?.to_str()?;
        Some(name.strip_suffix(".js").unwrap_or(name).to_string())
    }

    fn references(&self, source: &str, name: &str) -> bool {
        IMPORT_RE
            .captures_iter(source)
            .filter_map(|caps| caps.get(1))
            .any(|spec| {
                let last = spec.as_str().rsplit('/').next().unwrap_or_default();
                last.strip_suffix(".js").unwrap_or(last) == name
            })
    }
}

/// The bundler's own first complaint, skipping the `Command ... failed` header.
fn first_error_line(message: &str) -> &str {
    let mut lines = message.lines().map(str::trim).filter(|l| !l.is_empty());
    let header = lines.next().unwrap_or_default();
    lines
        .find(|l| !l.starts_with("Stdout:"))
        .unwrap_or(header)
}
