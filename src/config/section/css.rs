//! `[css]` section: CSS entry modules and the transform chain.
//!
//! # Example
//!
//! ```toml
//! [css]
//! modules = ["src/css/modules/*.css"]
//! watch = ["src/css/**/*.css", "static/**/*.{html,twig}"]
//! dist = "static/dist/css"
//! utility = "src/css/modules/utility.css"
//!
//! [css.targets]
//! chrome = 58
//! safari = 11
//!
//! [css.processor]
//! enable = true
//! command = ["npx", "tailwindcss"]
//! config = "tailwind.config.js"
//! # The utility module then runs through:
//! #   npx tailwindcss -c tailwind.config.js -i src/css/modules/utility.css
//! # and its stdout continues into the lightningcss chain.
//! ```

use super::{validate_command, validate_patterns};
use crate::config::{ConfigDiagnostics, FieldPath};
use lightningcss::targets::Browsers;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CssConfig {
    /// Entry module globs, each match compiles to one output file.
    pub modules: Vec<String>,
    /// Globs whose changes trigger a rebuild in watch mode.
    pub watch: Vec<String>,
    /// Output directory for compiled CSS.
    pub dist: PathBuf,
    /// Utility module rebuilt whenever a non-CSS watched file (template) changes.
    pub utility: Option<PathBuf>,
    /// Browser targets for prefixing and down-leveling in production.
    pub targets: BrowserTargets,
    /// Utility-class generator run on the utility module.
    pub processor: CssProcessorConfig,
}

impl Default for CssConfig {
    fn default() -> Self {
        Self {
            modules: vec!["src/css/modules/*.css".into()],
            watch: vec![
                "src/css/**/*.css".into(),
                "static/**/*.{html,twig}".into(),
                "src/js/**/*.{js,svelte}".into(),
            ],
            dist: PathBuf::from("static/dist/css"),
            utility: Some(PathBuf::from("src/css/modules/utility.css")),
            targets: BrowserTargets::legacy(),
            processor: CssProcessorConfig::default(),
        }
    }
}

impl CssConfig {
    pub const MODULES: FieldPath = FieldPath::new("css.modules");
    pub const WATCH: FieldPath = FieldPath::new("css.watch");
    pub const UTILITY: FieldPath = FieldPath::new("css.utility");
    pub const TARGETS: FieldPath = FieldPath::new("css.targets");
    pub const PROCESSOR: FieldPath = FieldPath::new("css.processor");

    /// Validate CSS configuration.
    ///
    /// # Checks
    /// - `modules` and `watch` are non-empty lists of valid globs
    /// - `utility`, when set, exists on disk (warning only)
    /// - browser names are known and their versions positive
    /// - an enabled processor has an installed command, a utility module to
    ///   run on, and an existing config file when one is named
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        validate_patterns(&self.modules, Self::MODULES, diag);
        validate_patterns(&self.watch, Self::WATCH, diag);

        if let Some(utility) = &self.utility
            && !utility.is_file()
        {
            diag.warn(
                Self::UTILITY,
                format!("utility module not found: {}", utility.display()),
            );
        }

        for name in self.targets.unknown.keys() {
            diag.error_with_hint(
                Self::TARGETS,
                format!("unknown browser `{name}`"),
                "use one of android, chrome, edge, firefox, ie, ios_saf, opera, safari, samsung",
            );
        }
        for (name, version) in self.targets.iter() {
            if version == 0 {
                diag.error(Self::TARGETS, format!("`{name}` version must be positive"));
            }
        }

        if self.processor.enable {
            self.validate_processor(diag);
        }
    }

    fn validate_processor(&self, diag: &mut ConfigDiagnostics) {
        let field = CssProcessorConfig::COMMAND;
        validate_command(&self.processor.command, field, diag);

        if self.utility.is_none() {
            diag.error_with_hint(
                Self::PROCESSOR,
                "processor is enabled but no utility module is set",
                format!("set {} or disable the processor", Self::UTILITY),
            );
        }
        if let Some(config) = &self.processor.config
            && !config.is_file()
        {
            diag.error(
                CssProcessorConfig::CONFIG,
                format!("processor config not found: {}", config.display()),
            );
        }
    }
}

/// External utility-class generator (Tailwind in JIT mode).
///
/// It scans the templates named in its own config, so the utility module is
/// rebuilt whenever a watched template changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CssProcessorConfig {
    pub enable: bool,
    /// Command printing the processed CSS to stdout, e.g. `["npx", "tailwindcss"]`.
    pub command: Vec<String>,
    /// Processor config file, passed as `-c`.
    pub config: Option<PathBuf>,
}

impl Default for CssProcessorConfig {
    fn default() -> Self {
        Self {
            enable: false,
            command: vec!["tailwindcss".into()],
            config: None,
        }
    }
}

impl CssProcessorConfig {
    pub const COMMAND: FieldPath = FieldPath::new("css.processor.command");
    pub const CONFIG: FieldPath = FieldPath::new("css.processor.config");
}

/// Minimum browser major versions.
///
/// Unset browsers are not considered when prefixing or down-leveling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrowserTargets {
    #[serde(default)]
    pub android: Option<u32>,
    #[serde(default)]
    pub chrome: Option<u32>,
    #[serde(default)]
    pub edge: Option<u32>,
    #[serde(default)]
    pub firefox: Option<u32>,
    #[serde(default)]
    pub ie: Option<u32>,
    #[serde(default)]
    pub ios_saf: Option<u32>,
    #[serde(default)]
    pub opera: Option<u32>,
    #[serde(default)]
    pub safari: Option<u32>,
    #[serde(default)]
    pub samsung: Option<u32>,
    /// Anything else under `[css.targets]`, rejected during validation.
    #[serde(flatten, skip_serializing)]
    pub unknown: BTreeMap<String, toml::Value>,
}

impl BrowserTargets {
    /// chrome 58, firefox 57, safari 11, edge 16.
    pub fn legacy() -> Self {
        Self {
            chrome: Some(58),
            firefox: Some(57),
            safari: Some(11),
            edge: Some(16),
            ..Self::default()
        }
    }

    /// Iterate configured `(browser, major)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u32)> {
        [
            ("android", self.android),
            ("chrome", self.chrome),
            ("edge", self.edge),
            ("firefox", self.firefox),
            ("ie", self.ie),
            ("ios_saf", self.ios_saf),
            ("opera", self.opera),
            ("safari", self.safari),
            ("samsung", self.samsung),
        ]
        .into_iter()
        .filter_map(|(name, v)| v.map(|v| (name, v)))
    }

    /// Convert to lightningcss browser versions (`major << 16`).
    pub fn to_browsers(&self) -> Browsers {
        let encode = |v: Option<u32>| v.map(|major| major << 16);
        Browsers {
            android: encode(self.android),
            chrome: encode(self.chrome),
            edge: encode(self.edge),
            firefox: encode(self.firefox),
            ie: encode(self.ie),
            ios_saf: encode(self.ios_saf),
            opera: encode(self.opera),
            safari: encode(self.safari),
            samsung: encode(self.samsung),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.css.modules, vec!["src/css/modules/*.css"]);
        assert_eq!(config.css.watch.len(), 3);
        assert_eq!(config.css.dist, PathBuf::from("static/dist/css"));
        assert_eq!(
            config.css.utility,
            Some(PathBuf::from("src/css/modules/utility.css"))
        );
        assert_eq!(config.css.targets, BrowserTargets::legacy());
    }

    #[test]
    fn test_partial_targets_replace_defaults() {
        let config = test_parse_config("[css.targets]\nchrome = 90\n");
        assert_eq!(config.css.targets.chrome, Some(90));
        assert_eq!(config.css.targets.firefox, None);
    }

    #[test]
    fn test_to_browsers_encodes_major() {
        let browsers = BrowserTargets::legacy().to_browsers();
        assert_eq!(browsers.chrome, Some(58 << 16));
        assert_eq!(browsers.safari, Some(11 << 16));
        assert_eq!(browsers.ie, None);
    }

    #[test]
    fn test_validate_rejects_bad_glob_and_zero_version() {
        let mut config = test_parse_config("[css]\nmodules = [\"src/[css\"]\n[css.targets]\nchrome = 0\n");
        config.css.utility = None;
        let mut diag = ConfigDiagnostics::new();
        config.css.validate(&mut diag);
        assert_eq!(diag.len(), 2);
    }

    #[test]
    fn test_validate_rejects_unknown_browser() {
        let mut config = test_parse_config("[css.targets]\nchrome = 90\nnetscape = 4\n");
        config.css.utility = None;
        assert_eq!(config.css.targets.chrome, Some(90));
        let mut diag = ConfigDiagnostics::new();
        config.css.validate(&mut diag);
        assert_eq!(diag.len(), 1);
        assert!(diag.errors()[0].message.contains("netscape"));
    }

    #[test]
    fn test_processor_defaults_off() {
        let config = test_parse_config("[css.processor]\ncommand = [\"npx\", \"tailwindcss\"]\n");
        assert!(!config.css.processor.enable);
        assert_eq!(config.css.processor.command, vec!["npx", "tailwindcss"]);
        assert_eq!(config.css.processor.config, None);
    }

    #[test]
    fn test_validate_processor() {
        let mut config = test_parse_config(
            "[css.processor]\nenable = true\ncommand = [\"no-such-tailwind-xyz\"]\nconfig = \"/no/such/tailwind.js\"\n",
        );
        config.css.utility = None;
        let mut diag = ConfigDiagnostics::new();
        config.css.validate(&mut diag);

        let fields: Vec<&str> = diag.errors().iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["css.processor.command", "css.processor", "css.processor.config"]
        );
    }

    #[test]
    fn test_validate_empty_modules() {
        let mut config = test_parse_config("[css]\nmodules = []\n");
        config.css.utility = None;
        let mut diag = ConfigDiagnostics::new();
        config.css.validate(&mut diag);
        assert!(diag.has_errors());
    }
}
