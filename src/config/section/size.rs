//! `[size]` section: size rules checked against built assets.
//!
//! # Example
//!
//! ```toml
//! [size]
//! strict = true
//! rules = [
//!   { pattern = "static/dist/**/*.js", limit = 20 },
//!   { pattern = "static/dist/**/*.css", limit = 15 },
//! ]
//! ```

use crate::asset::glob::build_glob;
use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeConfig {
    /// Exit with an error when any file is over its limit.
    pub strict: bool,
    pub rules: Vec<SizeRule>,
}

/// Files matched by `pattern` must gzip to at most `limit` KB.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeRule {
    pub pattern: String,
    pub limit: f64,
}

impl SizeRule {
    pub fn new(pattern: impl Into<String>, limit: f64) -> Self {
        Self {
            pattern: pattern.into(),
            limit,
        }
    }
}

impl Default for SizeConfig {
    fn default() -> Self {
        Self {
            strict: false,
            rules: vec![
                SizeRule::new("static/dist/**/*.js", 20.0),
                SizeRule::new("static/dist/**/*.css", 15.0),
            ],
        }
    }
}

impl SizeConfig {
    pub const RULES: FieldPath = FieldPath::new("size.rules");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.rules.is_empty() {
            diag.warn(Self::RULES, "no size rules configured, nothing will be checked");
        }
        for rule in &self.rules {
            if let Err(e) = build_glob(&rule.pattern) {
                diag.error(Self::RULES, e.to_string());
            }
            if rule.limit.is_nan() || rule.limit <= 0.0 {
                diag.error(
                    Self::RULES,
                    format!("limit for `{}` must be positive, got {}", rule.pattern, rule.limit),
                );
            }
        }
    }
}
