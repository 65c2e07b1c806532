//! Logging utilities with colored output.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `debug!` macro for output only shown with `--verbose`
//! - timestamped event lines for build/watch activity (`file_event`,
//!   `file_info`, `timer`)
//!
//! # Example
//!
//! ```ignore
//! // Simple logging
//! log!("css"; "compiling {} modules", count);
//!
//! // Watch event
//! logger::file_event("modified", "src/css/partials/base.css", "Partial changed: rebuilding parent modules");
//! logger::timer("src/css/modules/app.css", elapsed);
//! ```

use owo_colors::OwoColorize;
use std::{
    io::{Write, stdout},
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
///
/// # Usage
/// ```ignore
/// debug!("module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix
#[inline]
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);

    let mut stdout = stdout().lock();
    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> String {
    let prefix = format!("[{module}]");
    match module_lower {
        "css" | "js" => prefix.bright_blue().bold().to_string(),
        "watch" => prefix.bright_green().bold().to_string(),
        "error" => prefix.bright_red().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Event Lines (timestamped)
// ============================================================================

/// Get current local time formatted as HH:MM:SS
fn now() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

fn timestamp() -> String {
    format!("[{}]", now()).dimmed().to_string()
}

fn write_line(line: &str) {
    let mut stdout = stdout().lock();
    writeln!(stdout, "{line}").ok();
    stdout.flush().ok();
}

/// Log a watch/build event with the triggering path and what happens next.
///
/// ```text
/// [09:11:08] [modified] src/css/partials/base.css
/// [09:11:08] ⟳  Partial changed: rebuilding parent modules
/// ```
pub fn file_event(event: &str, path: &str, message: &str) {
    let ts = timestamp();
    write_line(&format!(
        "{ts} {} {}",
        format!("[{event}]").magenta(),
        path.green()
    ));
    write_line(&format!("{ts} {}  {}", "⟳".cyan(), message.dimmed()));
}

/// Log a single file taking part in a batch.
///
/// ```text
/// [09:11:08]  - src/js/modules/app.js
/// ```
pub fn file_info(path: &str) {
    write_line(&format!(
        "{}{}",
        format!("[{}]  - ", now()).dimmed(),
        path.dimmed()
    ));
}

/// Log how long something took to build.
///
/// ```text
/// [09:11:08]  ✓ src/css/modules/app.css built in 12ms
/// ```
pub fn timer(label: &str, elapsed: Duration) {
    write_line(&format!(
        "{} {} {}",
        timestamp(),
        " ✓".green(),
        format!("{label} built in {}", format_duration(elapsed)).dimmed()
    ));
}

/// Format a duration as whole milliseconds.
pub fn format_duration(elapsed: Duration) -> String {
    format!("{}ms", elapsed.as_millis())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_toggle() {
        set_verbose(true);
        assert!(is_verbose());
        set_verbose(false);
        assert!(!is_verbose());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(0)), "0ms");
        assert_eq!(format_duration(Duration::from_micros(12_900)), "12ms");
        assert_eq!(format_duration(Duration::from_secs(2)), "2000ms");
    }

    #[test]
    fn test_now_format() {
        let t = now();
        assert_eq!(t.len(), 8);
        assert_eq!(t.matches(':').count(), 2);
    }

    #[test]
    fn test_prefix_contains_module() {
        assert!(colorize_prefix("css", "css").contains("[css]"));
        assert!(colorize_prefix("Size", "size").contains("[Size]"));
    }
}
