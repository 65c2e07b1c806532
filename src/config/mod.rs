//! Pipeline configuration management for `assetpipe.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # [css] [js] [manifest] [size]
//! ├── types/         # ConfigError, ConfigDiagnostics, FieldPath
//! ├── util.rs        # config file discovery
//! └── mod.rs         # PipelineConfig (this file)
//! ```
//!
//! The configuration is built once at startup and handed to every component
//! behind an `Arc`. Nothing reads it through global state.

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{CssConfig, JsConfig, ManifestConfig, SizeConfig};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use crate::cli::{Cli, Commands};
use crate::core::BuildMode;
use crate::utils::path::normalize_path;
use crate::{debug, log};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing assetpipe.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file, or cwd without one
    #[serde(skip)]
    pub root: PathBuf,

    /// Development or production, resolved from env/CLI (internal use only)
    #[serde(skip)]
    pub mode: BuildMode,

    /// Directory holding every built asset and `manifest.json`
    pub dist: PathBuf,

    pub css: CssConfig,
    pub js: JsConfig,
    pub manifest: ManifestConfig,
    pub size: SizeConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            root: PathBuf::new(),
            mode: BuildMode::default(),
            dist: PathBuf::from("static/dist"),
            css: CssConfig::default(),
            js: JsConfig::default(),
            manifest: ManifestConfig::default(),
            size: SizeConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file. Without one, the
    /// defaults apply and cwd becomes the project root.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let (mut config, config_path, root) = match find_config_file(&cli.config) {
            Some(path) => {
                let config = Self::from_path(&path)?;
                let root = path.parent().map(Path::to_path_buf).unwrap_or(cwd);
                (config, path, root)
            }
            None => {
                debug!("config"; "{} not found, using defaults", cli.config.display());
                (Self::default(), cwd.join(&cli.config), cwd)
            }
        };

        config.config_path = config_path;
        config.mode = BuildMode::resolve(cli.mode);
        config.finalize(&root);
        config.validate(&cli.command)?;

        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Join a path with the root directory.
    #[cfg(test)]
    pub fn root_join(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    /// Get path relative to the project root
    pub fn root_relative(&self, path: impl AsRef<Path>) -> PathBuf {
        path.as_ref()
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.as_ref().to_path_buf())
    }

    /// Root-relative path rendered for log output.
    pub fn display(&self, path: impl AsRef<Path>) -> String {
        self.root_relative(path).display().to_string()
    }

    // ========================================================================
    // path normalization
    // ========================================================================

    /// Resolve every configured directory against the project root.
    ///
    /// Glob patterns stay root-relative; they are matched against
    /// root-relative paths.
    pub(crate) fn finalize(&mut self, root: &Path) {
        let root = normalize_path(root);
        self.config_path = normalize_path(&self.config_path);

        self.dist = normalize_path(&root.join(&self.dist));
        self.css.dist = normalize_path(&root.join(&self.css.dist));
        self.js.dist = normalize_path(&root.join(&self.js.dist));
        if let Some(utility) = self.css.utility.take() {
            self.css.utility = Some(normalize_path(&root.join(utility)));
        }
        if let Some(processor_config) = self.css.processor.config.take() {
            self.css.processor.config = Some(normalize_path(&root.join(processor_config)));
        }

        self.root = root;
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate the sections the current command uses.
    ///
    /// Collects all validation errors and returns them at once.
    pub fn validate(&self, command: &Commands) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        if command.uses_css() {
            self.css.validate(&mut diag);
        }
        if command.uses_js() {
            self.js.validate(&mut diag);
        }
        if command.uses_manifest() {
            self.manifest.validate(&mut diag);
        }
        if command.uses_size() {
            self.size.validate(&mut diag);
        }

        diag.print_warnings();

        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields (to catch typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> PipelineConfig {
    let (parsed, ignored) = PipelineConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

/// Default config rooted at `root`, with paths finalized.
#[cfg(test)]
pub fn test_config(root: &Path, mode: BuildMode) -> PipelineConfig {
    let mut config = PipelineConfig {
        mode,
        config_path: root.join("assetpipe.toml"),
        ..PipelineConfig::default()
    };
    config.finalize(root);
    config
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_toml_is_error() {
        // Invalid TOML syntax - unclosed bracket
        let result = PipelineConfig::parse_with_ignored("[css\nmodules = []");
        assert!(result.is_err());
    }

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.config_path, PathBuf::new());
        assert_eq!(config.dist, PathBuf::from("static/dist"));
        assert_eq!(config.mode, BuildMode::PRODUCTION);
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "dist = \"public\"\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = PipelineConfig::parse_with_ignored(content).unwrap();

        assert_eq!(config.dist, PathBuf::from("public"));
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_no_unknown_fields() {
        let content = "[css]\ndist = \"out/css\"\n[js]\ntarget = \"es2017\"";
        let (config, ignored) = PipelineConfig::parse_with_ignored(content).unwrap();
        assert!(ignored.is_empty());
        assert_eq!(config.js.target, "es2017");
    }

    #[test]
    fn test_finalize_resolves_against_root() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = test_config(tmp.path(), BuildMode::DEVELOPMENT);
        let root = normalize_path(tmp.path());

        assert_eq!(config.get_root(), root);
        assert_eq!(config.dist, root.join("static/dist"));
        assert_eq!(config.css.dist, root.join("static/dist/css"));
        assert_eq!(config.js.dist, root.join("static/dist/js"));
        assert_eq!(
            config.css.utility,
            Some(root.join("src/css/modules/utility.css"))
        );
        // Globs stay relative
        assert_eq!(config.css.modules, vec!["src/css/modules/*.css"]);
    }

    #[test]
    fn test_display_is_root_relative() {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = test_config(tmp.path(), BuildMode::PRODUCTION);
        let path = config.root_join("src/css/modules/a.css");
        assert_eq!(config.display(&path), "src/css/modules/a.css");
        assert_eq!(config.display("/elsewhere/x.css"), "/elsewhere/x.css");
    }
}
