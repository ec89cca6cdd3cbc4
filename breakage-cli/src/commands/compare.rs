//! Compare command - two package directories on disk.

use std::path::Path;

use anyhow::{Context, Result};

use breakage_core::scanner::load_directory;
use breakage_core::BreakingReport;

use super::CheckOptions;

pub fn run(old: &Path, new: &Path, options: &CheckOptions) -> Result<BreakingReport> {
    let before = load_directory(old, &options.scan)
        .with_context(|| format!("Failed to read package {}", old.display()))?;
    let after = load_directory(new, &options.scan)
        .with_context(|| format!("Failed to read package {}", new.display()))?;

    tracing::info!(
        old = %old.display(),
        new = %new.display(),
        old_files = before.len(),
        new_files = after.len(),
        "comparing directories"
    );

    breakage_core::check(&before, &after, &options.allow).context("Failed to analyze packages")
}
