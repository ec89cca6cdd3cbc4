//! Package source discovery using the `ignore` crate.
//!
//! A Go package is one directory, so the walk is non-recursive. Ignore
//! files (`.gitignore`, `.breakageignore`) and extra patterns are honoured;
//! `_test.go` files are left out unless asked for.

use ignore::WalkBuilder;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::parser::{SourceFile, SourceSet};

/// Name of the per-directory ignore file.
pub const IGNORE_FILENAME: &str = ".breakageignore";

/// What to pick up from a package directory.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Include `_test.go` files.
    pub include_tests: bool,

    /// Additional gitignore-style patterns to skip.
    pub ignore_patterns: Vec<String>,

    pub follow_symlinks: bool,
}

/// Information about a scanned file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ScannedFile {
    /// Path relative to the package directory.
    pub path: String,

    /// File size in bytes.
    pub size_bytes: u64,
}

/// Result of scanning a package directory.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ScanResult {
    /// Discovered files, sorted by path.
    pub files: Vec<ScannedFile>,

    /// Number of files skipped as non-Go or test files.
    pub skipped_count: usize,

    /// Time taken for the scan in milliseconds.
    pub duration_ms: f64,
}

impl ScanResult {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn is_go_file(name: &str, include_tests: bool) -> bool {
    name.ends_with(".go") && (include_tests || !name.ends_with("_test.go"))
}

/// List the Go files of a package directory.
pub fn scan_package(root: &Path, options: &ScanOptions) -> Result<ScanResult> {
    let start = Instant::now();

    if !root.is_dir() {
        return Err(Error::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("Not a directory: {}", root.display()),
        )));
    }

    let mut builder = WalkBuilder::new(root);
    builder
        .max_depth(Some(1))
        .hidden(true)
        .git_ignore(true)
        .git_exclude(true)
        .require_git(false)
        .follow_links(options.follow_symlinks)
        .add_custom_ignore_filename(IGNORE_FILENAME);

    if !options.ignore_patterns.is_empty() {
        let mut overrides = ignore::overrides::OverrideBuilder::new(root);
        for pattern in &options.ignore_patterns {
            // A leading ! turns an override into an ignore rule.
            if let Err(e) = overrides.add(&format!("!{}", pattern)) {
                tracing::warn!(pattern = %pattern, error = %e, "invalid ignore pattern");
            }
        }
        builder.overrides(overrides.build()?);
    }

    let mut files = Vec::new();
    let mut skipped = 0;
    for entry in builder.build() {
        let entry = entry?;
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !is_go_file(&name, options.include_tests) {
            skipped += 1;
            continue;
        }
        let rel_path = entry
            .path()
            .strip_prefix(root)
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|_| name.to_string());
        let size_bytes = entry.metadata().map(|m| m.len()).unwrap_or(0);
        files.push(ScannedFile {
            path: rel_path,
            size_bytes,
        });
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(ScanResult {
        files,
        skipped_count: skipped,
        duration_ms: start.elapsed().as_secs_f64() * 1000.0,
    })
}

/// Scan a package directory and read its files in parallel.
pub fn load_directory(root: &Path, options: &ScanOptions) -> Result<SourceSet> {
    let scan = scan_package(root, options)?;
    tracing::debug!(
        root = %root.display(),
        files = scan.len(),
        skipped = scan.skipped_count,
        duration_ms = scan.duration_ms,
        "scanned package"
    );

    let sources = scan
        .files
        .par_iter()
        .map(|file| -> Result<SourceFile> {
            let source = fs::read_to_string(root.join(&file.path))?;
            Ok(SourceFile::new(file.path.clone(), source))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut set = SourceSet::new(root.display().to_string());
    for file in sources {
        set.push(file);
    }
    Ok(set)
}
