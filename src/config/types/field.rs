//! Config field path used in diagnostics.

use owo_colors::OwoColorize;
use std::fmt;

/// Dotted path to a config field (e.g. `css.modules`).
///
/// Sections expose their field paths as associated constants so that
/// validation messages always point at the key the user has to edit.
///
/// # Example
///
/// ```ignore
/// impl SizeConfig {
///     pub const RULES: FieldPath = FieldPath::new("size.rules");
/// }
///
/// diag.error(SizeConfig::RULES, "limit must be positive");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath(&'static str);

impl FieldPath {
    #[inline]
    pub const fn new(path: &'static str) -> Self {
        Self(path)
    }

    #[inline]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_args!("`{}`", self.0).bright_blue())
    }
}
