//! `[manifest]` section.

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    /// Extensions (without dot) of built assets that get a version hash.
    pub extensions: Vec<String>,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            extensions: ["jpg", "png", "js", "css", "svg"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl ManifestConfig {
    pub const EXTENSIONS: FieldPath = FieldPath::new("manifest.extensions");

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.extensions.is_empty() {
            diag.error(
                Self::EXTENSIONS,
                format!("{} must list at least one extension", Self::EXTENSIONS),
            );
        }
        for ext in &self.extensions {
            if ext.starts_with('.') {
                diag.error_with_hint(
                    Self::EXTENSIONS,
                    format!("`{ext}` starts with a dot"),
                    format!("write `{}`", ext.trim_start_matches('.')),
                );
            }
        }
    }

    /// Whether `ext` is one of the hashed extensions (case-insensitive).
    pub fn includes(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}
