//! Size checks for built assets.
//!
//! Every file matched by a `[size]` rule is measured raw and gzipped. A file
//! whose gzip size exceeds the rule's limit fails. The report lists passing
//! files first.

use crate::asset::glob::GlobList;
use crate::config::PipelineConfig;
use crate::log;
use crate::utils::plural::plural_count;
use anyhow::Result;
use flate2::{Compression, write::GzEncoder};
use owo_colors::OwoColorize;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Bytes to kilobytes (1000), rounded to one decimal.
pub fn to_kb(bytes: u64) -> f64 {
    (bytes as f64 / 1000.0 * 10.0).round() / 10.0
}

/// Length of `bytes` after gzip at the default level.
pub fn gzip_len(bytes: &[u8]) -> io::Result<u64> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?.len() as u64)
}

/// Measured sizes of one file, in KB.
#[derive(Debug, Clone, PartialEq)]
pub struct FileStats {
    pub file: String,
    pub raw: f64,
    pub gzip: f64,
    pub limit: f64,
}

impl FileStats {
    pub fn measure(path: &Path, file: String, limit: f64) -> io::Result<Self> {
        let bytes = fs::read(path)?;
        Ok(Self {
            file,
            raw: to_kb(bytes.len() as u64),
            gzip: to_kb(gzip_len(&bytes)?),
            limit,
        })
    }

    pub fn over_limit(&self) -> bool {
        self.gzip > self.limit
    }

    fn render(&self, mark: &str) -> String {
        let detail = if self.over_limit() {
            format!("over limit ({}/{}KB)", self.gzip, self.limit)
        } else {
            format!("limit {}KB", self.limit)
        };
        format!(
            "{mark} {}\n  raw: {}KB | gzip: {}KB | {detail}",
            self.file, self.raw, self.gzip
        )
    }
}

#[derive(Debug, Default)]
pub struct SizeReport {
    files: Vec<FileStats>,
}

impl SizeReport {
    /// Passing files first, failing last; input order kept within each group.
    pub fn new(mut files: Vec<FileStats>) -> Self {
        files.sort_by_key(FileStats::over_limit);
        Self { files }
    }

    #[cfg(test)]
    pub fn files(&self) -> &[FileStats] {
        &self.files
    }

    pub fn has_failures(&self) -> bool {
        self.files.iter().any(FileStats::over_limit)
    }

    pub fn failures(&self) -> usize {
        self.files.iter().filter(|f| f.over_limit()).count()
    }

    /// One block per file, blank line between blocks.
    fn render_with(&self, mark: impl Fn(bool) -> String) -> String {
        self.files
            .iter()
            .map(|f| f.render(&mark(f.over_limit())))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Plain-text report.
    #[cfg(test)]
    pub fn render(&self) -> String {
        self.render_with(|over| String::from(if over { "✗" } else { "✓" }))
    }

    pub fn print(&self) {
        if !self.files.is_empty() {
            let report = self.render_with(|over| {
                if over {
                    "✗".red().bold().to_string()
                } else {
                    "✓".green().bold().to_string()
                }
            });
            println!("{report}\n");
        }

        if self.has_failures() {
            log!("size"; "{} over limit", plural_count(self.failures(), "file"));
        } else {
            log!("size"; "{} within limits", plural_count(self.files.len(), "file"));
        }
    }
}

/// Measure every file matched by a size rule.
///
/// Unreadable files are skipped with a warning.
pub fn check(config: &PipelineConfig) -> Result<SizeReport> {
    let root = config.get_root();
    let mut files = Vec::new();

    for rule in &config.size.rules {
        let globs = GlobList::new(std::slice::from_ref(&rule.pattern))?;
        for path in globs.expand(root) {
            match FileStats::measure(&path, config.display(&path), rule.limit) {
                Ok(stats) => files.push(stats),
                Err(e) => log!("size"; "warning: skipping {}: {}", config.display(&path), e),
            }
        }
    }

    Ok(SizeReport::new(files))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{test_config, test_parse_config};
    use crate::core::BuildMode;
    use tempfile::TempDir;

    fn stats(file: &str, gzip: f64, limit: f64) -> FileStats {
        FileStats {
            file: file.into(),
            raw: gzip * 3.0,
            gzip,
            limit,
        }
    }

    /// Deterministic bytes that gzip cannot shrink much.
    fn noise(len: usize) -> Vec<u8> {
        let mut state: u32 = 0x1234_5678;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                (state >> 16) as u8
            })
            .collect()
    }

    #[test]
    fn test_to_kb() {
        assert_eq!(to_kb(0), 0.0);
        assert_eq!(to_kb(500), 0.5);
        assert_eq!(to_kb(1049), 1.0);
        assert_eq!(to_kb(1060), 1.1);
        assert_eq!(to_kb(20_000), 20.0);
    }

    #[test]
    fn test_over_limit_listed_last() {
        let report = SizeReport::new(vec![
            stats("big.css", 12.0, 10.0),
            stats("a.js", 0.5, 20.0),
            stats("huge.js", 30.0, 20.0),
            stats("b.js", 1.0, 20.0),
        ]);
        let order: Vec<_> = report.files().iter().map(|f| f.file.as_str()).collect();
        assert_eq!(order, vec!["a.js", "b.js", "big.css", "huge.js"]);
        assert_eq!(report.failures(), 2);
    }

    #[test]
    fn test_limit_is_inclusive() {
        assert!(!stats("edge.css", 10.0, 10.0).over_limit());
        assert!(stats("edge.css", 10.1, 10.0).over_limit());
    }

    #[test]
    fn test_render_lines() {
        let report = SizeReport::new(vec![
            FileStats { file: "static/dist/css/big.css".into(), raw: 20.0, gzip: 12.0, limit: 10.0 },
            FileStats { file: "static/dist/js/app.js".into(), raw: 2.0, gzip: 0.5, limit: 20.0 },
        ]);
        assert_eq!(
            report.render(),
            "✓ static/dist/js/app.js\n  raw: 2KB | gzip: 0.5KB | limit 20KB\n\n\
             ✗ static/dist/css/big.css\n  raw: 20KB | gzip: 12KB | over limit (12/10KB)"
        );
    }

    #[test]
    fn test_check_end_to_end() {
        let tmp = TempDir::new().unwrap();
        let mut config = test_config(tmp.path(), BuildMode::PRODUCTION);
        config.size = test_parse_config("[size]\nrules = [{ pattern = \"dist/**/*.css\", limit = 1 }]").size;

        let dist = config.root_join("dist/css");
        fs::create_dir_all(&dist).unwrap();
        fs::write(dist.join("a.css"), "body{margin:0}".repeat(30)).unwrap();
        fs::write(dist.join("b.css"), noise(2500)).unwrap();
        fs::write(dist.join("c.js"), noise(5000)).unwrap();

        let report = check(&config).unwrap();
        let files = report.files();
        assert_eq!(files.len(), 2);

        assert_eq!(files[0].file, "dist/css/a.css");
        assert!(!files[0].over_limit());
        assert!(files[0].gzip <= 0.5);

        assert_eq!(files[1].file, "dist/css/b.css");
        assert!(files[1].over_limit());
        assert!(files[1].gzip >= 2.0);

        assert!(report.has_failures());
        let last = report.render().split("\n\n").last().unwrap().to_string();
        assert!(last.starts_with("✗ dist/css/b.css"));
    }

    #[test]
    fn test_check_without_matches_is_empty() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path(), BuildMode::PRODUCTION);
        let report = check(&config).unwrap();
        assert!(report.files().is_empty());
        assert!(!report.has_failures());
    }
}
