//! Breaking-change analysis over two symbol tables.
//!
//! For every exported symbol of the before snapshot, the analyzer decides
//! whether the same name in the after snapshot is still usable by existing
//! clients. Identity comes from [`crate::typecmp`]; structs get a weaker,
//! asymmetric compatibility rule on top of it.
//!
//! # Example
//!
//! ```
//! use breakage_core::differ::{analyze, ChangeKind};
//! use breakage_core::scope::{Symbol, SymbolKind, SymbolTable};
//! use breakage_core::types::BasicKind;
//!
//! let mut before = SymbolTable::new("demo");
//! let int = before.types.basic(BasicKind::Int);
//! let f = before.types.func(&[int], &[], false);
//! before.insert(Symbol::new("F", SymbolKind::Func, f, true)).unwrap();
//!
//! let after = SymbolTable::new("demo");
//! let report = analyze(&before, &after);
//! assert_eq!(report.findings[0].change, ChangeKind::Removed);
//! ```

pub mod allowlist;
pub mod changes;
pub mod comparator;

pub use allowlist::Allowlist;
pub use changes::{BreakingReport, ChangeKind, Declaration, Finding, ReportSummary};
pub use comparator::{analyze, analyze_with, compatible, find_breaking_removals};
