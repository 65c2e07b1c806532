//! Content-hashed asset manifest for cache busting.
//!
//! Every built asset under `dist` whose extension is configured gets an
//! entry `"app.css": "app.css?ver=1a2b3c4d5e"`. The hash depends on the
//! bytes only, so unchanged assets keep their URL across builds.

use crate::config::{ManifestConfig, PipelineConfig};
use crate::log;
use anyhow::{Context, Result, bail};
use jwalk::WalkDir;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Hex characters kept from the blake3 digest.
pub const HASH_LEN: usize = 10;

pub const MANIFEST_FILE: &str = "manifest.json";

/// First [`HASH_LEN`] hex chars of the blake3 digest of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String {
    let digest = blake3::hash(bytes);
    hex::encode(&digest.as_bytes()[..HASH_LEN / 2])
}

/// `app.css` + hash -> `app.css?ver=<hash>`
pub fn versioned_name(name: &str, hash: &str) -> String {
    format!("{name}?ver={hash}")
}

/// Result of hashing a set of assets.
#[derive(Debug, Default)]
pub struct Manifest {
    /// Base name -> versioned name, sorted by key.
    pub entries: BTreeMap<String, String>,
    /// Files that could not be read.
    pub skipped: Vec<PathBuf>,
}

impl Manifest {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.entries)?)
    }
}

/// Built assets under `dist` with a configured extension, sorted.
pub fn collect_assets(dist: &Path, config: &ManifestConfig) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dist)
        .sort(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path())
        .filter(|p| p.file_name().is_some_and(|n| n != MANIFEST_FILE))
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| config.includes(e))
        })
        .collect();
    files.sort();
    files
}

/// Hash `files` in parallel and map base names to versioned names.
///
/// Unreadable files are skipped with a warning. When two files share a
/// base name the later one (in input order) wins.
pub fn build_manifest(files: &[PathBuf]) -> Manifest {
    let hashed: Vec<_> = files
        .par_iter()
        .map(|path| (path, fs::read(path).map(|bytes| content_hash(&bytes))))
        .collect();

    let mut manifest = Manifest::default();
    for (path, result) in hashed {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        match result {
            Ok(hash) => {
                let versioned = versioned_name(&name, &hash);
                if manifest.entries.insert(name.clone(), versioned).is_some() {
                    log!("manifest"; "warning: duplicate name `{}`, using {}", name, path.display());
                }
            }
            Err(e) => {
                log!("manifest"; "warning: skipping {}: {}", path.display(), e);
                manifest.skipped.push(path.clone());
            }
        }
    }
    manifest
}

/// Hash every configured asset under `dist` and write `dist/manifest.json`.
pub fn generate(config: &PipelineConfig) -> Result<Manifest> {
    let dist = &config.dist;
    if !dist.is_dir() {
        bail!(
            "output directory `{}` not found, build assets first",
            config.display(dist)
        );
    }

    let files = collect_assets(dist, &config.manifest);
    let manifest = build_manifest(&files);

    let out = dist.join(MANIFEST_FILE);
    fs::write(&out, manifest.to_json()?)
        .with_context(|| format!("Failed to write {}", out.display()))?;

    log!("manifest"; "✓ Created file hashes in {}", config.display(&out));
    Ok(manifest)
}
