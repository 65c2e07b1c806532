//! Built-asset handling and shared glob matching.
//!
//! - `glob`: project-relative glob patterns (entry modules, watch filters, size rules)
//! - `manifest`: content-hashed `manifest.json` for cache busting
//! - `size`: raw/gzip size checks against configured limits

pub mod glob;
pub mod manifest;
pub mod size;
