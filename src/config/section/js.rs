//! `[js]` section: JS entry modules and the external bundler.
//!
//! # Example
//!
//! ```toml
//! [js]
//! modules = ["src/js/modules/*.js"]
//! watch = ["src/js/**/*.{js,svelte}"]
//! dist = "static/dist/js"
//! bundler = ["npx", "esbuild"]
//! target = "es2020"
//! # Automatically expands to:
//! #   npx esbuild <entries...> --bundle --outdir=static/dist/js --outbase=src/js/modules
//! #       --target=es2020 --sourcemap[=inline]
//! ```
//!
//! # Build scripts
//!
//! The esbuild CLI cannot load plugins (Svelte components, for one). Point
//! `bundler` at a script instead:
//!
//! ```toml
//! [js]
//! bundler = ["node", "build.mjs"]
//! ```
//!
//! The script gets the same arguments as esbuild would, and the settings
//! again as environment variables so it never has to parse them:
//!
//! | Variable              | Value                                   |
//! |-----------------------|-----------------------------------------|
//! | `ASSETPIPE_ENTRIES`   | entry modules, root-relative, `,`-joined |
//! | `ASSETPIPE_OUTDIR`    | `js.dist`, root-relative                |
//! | `ASSETPIPE_OUTBASE`   | literal base of `js.modules`            |
//! | `ASSETPIPE_TARGET`    | `js.target`                             |
//! | `ASSETPIPE_SOURCEMAP` | `inline` or `external`                  |
//! | `ASSETPIPE_MINIFY`    | `true` or `false`                       |
//! | `ASSETPIPE_MODE`      | `development` or `production`           |
//!
//! A script typically hands these to `esbuild.build({ plugins: [sveltePlugin()] })`.

use super::{validate_command, validate_patterns};
use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JsConfig {
    /// Entry module globs, each match is a bundler entry point.
    pub modules: Vec<String>,
    /// Globs whose changes trigger a rebuild in watch mode.
    pub watch: Vec<String>,
    /// Output directory for bundles.
    pub dist: PathBuf,
    /// Bundler command (e.g. `["esbuild"]` or `["npx", "esbuild"]`).
    pub bundler: Vec<String>,
    /// Language target passed as `--target`.
    pub target: String,
    /// Pass `--minify` in production.
    pub minify: bool,
    /// Extra arguments appended to every bundler invocation.
    pub args: Vec<String>,
    /// Print the full bundler error output instead of its first line.
    pub verbose_errors: bool,
}

impl Default for JsConfig {
    fn default() -> Self {
        Self {
            modules: vec!["src/js/modules/*.js".into()],
            watch: vec!["src/js/**/*.{js,svelte}".into()],
            dist: PathBuf::from("static/dist/js"),
            bundler: vec!["esbuild".into()],
            target: "es2020".into(),
            minify: false,
            args: Vec::new(),
            verbose_errors: false,
        }
    }
}

impl JsConfig {
    pub const MODULES: FieldPath = FieldPath::new("js.modules");
    pub const WATCH: FieldPath = FieldPath::new("js.watch");
    pub const BUNDLER: FieldPath = FieldPath::new("js.bundler");
    pub const TARGET: FieldPath = FieldPath::new("js.target");

    /// Validate JS configuration.
    ///
    /// # Checks
    /// - `modules` and `watch` are non-empty lists of valid globs
    /// - `bundler` is non-empty and `bundler[0]` is installed (or a package runner)
    /// - `target` is non-empty
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        validate_patterns(&self.modules, Self::MODULES, diag);
        validate_patterns(&self.watch, Self::WATCH, diag);

        if self.target.trim().is_empty() {
            diag.error(Self::TARGET, format!("{} must not be empty", Self::TARGET));
        }

        validate_command(&self.bundler, Self::BUNDLER, diag);
    }
}
