//! Configuration section definitions.
//!
//! Each module corresponds to a section in `assetpipe.toml`:
//!
//! | Module     | TOML Section  | Purpose                                   |
//! |------------|---------------|-------------------------------------------|
//! | `css`      | `[css]`       | CSS entry modules, watch globs, targets   |
//! | `js`       | `[js]`        | JS entry modules, bundler command         |
//! | `manifest` | `[manifest]`  | Extensions hashed into `manifest.json`    |
//! | `size`     | `[size]`      | Size rules (glob + limit in KB)           |

mod css;
mod js;
mod manifest;
mod size;

pub use css::CssConfig;
pub use js::JsConfig;
pub use manifest::ManifestConfig;
pub use size::SizeConfig;

use super::{ConfigDiagnostics, FieldPath};
use crate::asset::glob::build_glob;

/// Validate that a pattern list is non-empty and every pattern compiles.
pub(crate) fn validate_patterns(patterns: &[String], field: FieldPath, diag: &mut ConfigDiagnostics) {
    if patterns.is_empty() {
        diag.error(field, format!("{field} must contain at least one glob pattern"));
        return;
    }
    for pattern in patterns {
        if let Err(e) = build_glob(pattern) {
            diag.error(field, e.to_string());
        }
    }
}

/// Validate an external command: non-empty, `cmd[0]` installed.
///
/// Package runners (`npx` and friends) can fetch the tool at runtime, so a
/// missing runner target only produces a hint.
pub(crate) fn validate_command(cmd: &[String], field: FieldPath, diag: &mut ConfigDiagnostics) {
    let Some(program) = cmd.first() else {
        diag.error(field, format!("{field} is empty"));
        return;
    };

    if which::which(program).is_ok() {
        return;
    }

    let is_package_runner = ["npx", "bunx", "pnpx", "yarn", "dlx"].contains(&program.as_str());
    if is_package_runner {
        if let Some(package) = cmd.get(1) {
            diag.hint(
                field,
                format!("`{package}` via `{program}`, ensure package is installed"),
            );
        }
    } else {
        diag.error_with_hint(
            field,
            format!("`{program}` not found"),
            format!("install the command or update {field}"),
        );
    }
}
