//! breakage core - API breaking-change detection for Go packages.
//!
//! Given "before" and "after" snapshots of a package, reports every exported
//! name whose "after" version is no longer a compatible replacement.
//!
//! # Layers
//!
//! - [`types`]: the type descriptor graph (arena of `TypeKind` nodes)
//! - [`typecmp`]: structural identity with cycle detection, and the struct
//!   compatibility rule
//! - [`scope`]: symbols and ordered per-snapshot symbol tables
//! - [`differ`]: the compatibility analyzer, findings and reports
//! - [`parser`]: Go front end (tree-sitter) producing symbol tables
//! - [`scanner`]: package directory discovery
//!
//! # Usage
//!
//! ```
//! use breakage_core::differ::Allowlist;
//! use breakage_core::parser::SourceSet;
//!
//! let before = SourceSet::from_files("old", [("a.go", "package p\nfunc F(x int) {}\n")]);
//! let after = SourceSet::from_files("new", [("a.go", "package p\nfunc F(x int, y string) {}\n")]);
//!
//! let report = breakage_core::check(&before, &after, &Allowlist::default()).unwrap();
//! assert_eq!(report.names(), vec!["F"]);
//! ```

pub mod differ;
pub mod display;
pub mod error;
pub mod parser;
pub mod scanner;
pub mod scope;
pub mod typecmp;
pub mod types;

pub use differ::{Allowlist, BreakingReport, ChangeKind, Finding};
pub use error::{Error, Result};
pub use scope::{Symbol, SymbolKind, SymbolTable};

use parser::SourceSet;

/// Parse both snapshots and analyze them.
pub fn check(before: &SourceSet, after: &SourceSet, allow: &Allowlist) -> Result<BreakingReport> {
    let (before, after) = parser::load_pair(before, after)?;
    Ok(differ::analyze_with(&before, &after, allow))
}
