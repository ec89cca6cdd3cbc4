//! Command implementations for the breakage CLI.
//!
//! Each command builds the two package snapshots its way and returns the
//! report; rendering and exit codes are handled by `main`.

use breakage_core::differ::Allowlist;
use breakage_core::scanner::ScanOptions;

pub mod compare;
pub mod git;

/// Settings shared by every command.
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    pub allow: Allowlist,
    pub scan: ScanOptions,
}
