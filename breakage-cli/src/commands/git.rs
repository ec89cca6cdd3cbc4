//! Git command - a revision against another revision or the working tree.

use std::path::Path;

use anyhow::{Context, Result};

use breakage_core::scanner::load_directory;
use breakage_core::BreakingReport;

use super::CheckOptions;
use crate::git::Repository;

/// Compare package `path` at `base` with the same directory at `head`, or
/// with the working tree when `head` is `None`.
pub fn run(
    repo_dir: &Path,
    base: &str,
    head: Option<&str>,
    path: &str,
    options: &CheckOptions,
) -> Result<BreakingReport> {
    let repo = Repository::open(repo_dir)?;
    let include_tests = options.scan.include_tests;

    let before = repo
        .package_sources(base, path, include_tests)
        .with_context(|| format!("Failed to read {} at {}", path, base))?;

    let after = match head {
        Some(head) => repo
            .package_sources(head, path, include_tests)
            .with_context(|| format!("Failed to read {} at {}", path, head))?,
        None => {
            let dir = repo.dir().join(path);
            load_directory(&dir, &options.scan)
                .with_context(|| format!("Failed to read package {}", dir.display()))?
        }
    };

    tracing::info!(
        base,
        head = head.unwrap_or("working tree"),
        path,
        "comparing revisions"
    );

    breakage_core::check(&before, &after, &options.allow).context("Failed to analyze packages")
}
