//! Compatibility analysis between two snapshots.

use std::time::Instant;

use crate::differ::allowlist::Allowlist;
use crate::differ::changes::{BreakingReport, ChangeKind, Finding};
use crate::scope::{SymbolRef, SymbolTable};
use crate::typecmp::{identical, struct_compatible};

/// Classify an exported before-symbol against its after counterpart.
///
/// Returns `None` when the after-symbol is an acceptable evolution.
fn judge(before: SymbolRef<'_>, after: Option<SymbolRef<'_>>) -> Option<ChangeKind> {
    // An exported name turning unexported is gone as far as clients care.
    let Some(after) = after.filter(|a| a.exported()) else {
        return Some(ChangeKind::Removed);
    };

    let (x, y) = (before.ty(), after.ty());
    if identical(x, y) {
        return None;
    }

    // Only reached with differing types: `var F func()` becoming `func F()`
    // keeps every call site working.
    if before.kind() != after.kind() {
        return Some(ChangeKind::KindChanged);
    }

    match (x.is_struct(), y.is_struct()) {
        (true, true) if struct_compatible(x, y) => None,
        (true, true) => Some(ChangeKind::TypeChanged),
        (true, false) | (false, true) => Some(ChangeKind::KindChanged),
        (false, false) => Some(ChangeKind::TypeChanged),
    }
}

/// Whether `after` is an acceptable evolution of `before`.
///
/// Unexported before-symbols are always compatible: changes to them are
/// never reported.
pub fn compatible(before: SymbolRef<'_>, after: Option<SymbolRef<'_>>) -> bool {
    !before.exported() || judge(before, after).is_none()
}

/// Every exported before-symbol that is incompatible with the after table,
/// in before-table insertion order.
pub fn find_breaking_removals(before: &SymbolTable, after: &SymbolTable) -> Vec<Finding> {
    before
        .iter()
        .filter(|a| a.exported())
        .filter_map(|a| {
            let b = after.lookup(a.name());
            let change = judge(a, b)?;
            tracing::debug!(name = a.name(), change = change.as_str(), "incompatible symbol");
            Some(match (change, b) {
                (ChangeKind::Removed, _) | (_, None) => Finding::removed(a),
                (change, Some(b)) => Finding::changed(change, a, b),
            })
        })
        .collect()
}

/// Analyze two snapshots into a report.
pub fn analyze(before: &SymbolTable, after: &SymbolTable) -> BreakingReport {
    analyze_with(before, after, &Allowlist::default())
}

/// Analyze two snapshots, moving findings whose names match `allow` into
/// the report's allowed list.
pub fn analyze_with(
    before: &SymbolTable,
    after: &SymbolTable,
    allow: &Allowlist,
) -> BreakingReport {
    let start = Instant::now();
    let mut report = BreakingReport::new(before.package.clone());

    for finding in find_breaking_removals(before, after) {
        if allow.allows(&finding.name) {
            report.add_allowed(finding);
        } else {
            report.add_finding(finding);
        }
    }

    report.finalize(start.elapsed().as_secs_f64() * 1000.0);
    tracing::debug!(
        before = before.len(),
        after = after.len(),
        breaking = report.findings.len(),
        duration_ms = report.duration_ms,
        "analysis complete"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::{Symbol, SymbolKind};
    use crate::types::{BasicKind, Field, Method, TypeGraph, TypeId};

    fn exported(name: &str) -> bool {
        name.starts_with(|c: char| c.is_uppercase())
    }

    fn add(table: &mut SymbolTable, name: &str, kind: SymbolKind, ty: TypeId) {
        table
            .insert(Symbol::new(name, kind, ty, exported(name)))
            .unwrap();
    }

    /// Table with a single function `name(params...)`.
    fn func_table(name: &str, params: &[BasicKind]) -> SymbolTable {
        let mut t = SymbolTable::new("pkg");
        let params: Vec<_> = params.iter().map(|&k| t.types.basic(k)).collect();
        let f = t.types.func(&params, &[], false);
        add(&mut t, name, SymbolKind::Func, f);
        t
    }

    fn struct_type(g: &mut TypeGraph, fields: &[(&str, BasicKind)]) -> TypeId {
        let fields = fields
            .iter()
            .map(|&(name, kind)| Field::new(name, g.basic(kind), exported(name)))
            .collect();
        let s = g.structure(fields);
        g.named("T", s)
    }

    fn struct_table(fields: &[(&str, BasicKind)]) -> SymbolTable {
        let mut t = SymbolTable::new("pkg");
        let ty = struct_type(&mut t.types, fields);
        add(&mut t, "T", SymbolKind::Type, ty);
        t
    }

    #[test]
    fn test_end_to_end_param_added() {
        let before = func_table("F", &[BasicKind::Int]);
        let after = func_table("F", &[BasicKind::Int, BasicKind::String]);

        let findings = find_breaking_removals(&before, &after);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].name, "F");
        assert_eq!(findings[0].change, ChangeKind::TypeChanged);
        assert_eq!(findings[0].before.type_text, "func(int)");
        assert_eq!(
            findings[0].after.as_ref().unwrap().type_text,
            "func(int, string)"
        );
    }

    #[test]
    fn test_end_to_end_removed() {
        let before = func_table("F", &[BasicKind::Int]);
        let after = SymbolTable::new("pkg");

        let findings = find_breaking_removals(&before, &after);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].name, "F");
        assert_eq!(findings[0].change, ChangeKind::Removed);
        assert!(findings[0].after.is_none());
    }

    #[test]
    fn test_unchanged_is_compatible() {
        let before = func_table("F", &[BasicKind::Int]);
        let after = func_table("F", &[BasicKind::Int]);
        assert!(find_breaking_removals(&before, &after).is_empty());
        assert!(compatible(
            before.lookup("F").unwrap(),
            after.lookup("F")
        ));
    }

    #[test]
    fn test_unexported_churn_never_breaks() {
        let before = func_table("helper", &[BasicKind::Int]);
        let renamed = func_table("other", &[BasicKind::Int]);
        let retyped = func_table("helper", &[BasicKind::String]);
        let empty = SymbolTable::new("pkg");

        for after in [&renamed, &retyped, &empty] {
            assert!(find_breaking_removals(&before, after).is_empty());
        }
        assert!(compatible(before.lookup("helper").unwrap(), None));
    }

    #[test]
    fn test_added_symbols_ignored() {
        let before = SymbolTable::new("pkg");
        let after = func_table("New", &[]);
        assert!(find_breaking_removals(&before, &after).is_empty());
    }

    #[test]
    fn test_exported_becoming_unexported_is_removal() {
        let before = func_table("F", &[BasicKind::Int]);
        let mut after = SymbolTable::new("pkg");
        let int = after.types.basic(BasicKind::Int);
        let f = after.types.func(&[int], &[], false);
        after
            .insert(Symbol::new("F", SymbolKind::Func, f, false))
            .unwrap();

        let findings = find_breaking_removals(&before, &after);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].change, ChangeKind::Removed);
        assert!(findings[0].after.is_none());
    }

    #[test]
    fn test_function_signature_changes() {
        use BasicKind::{Int, String as Str};
        let base = || {
            let mut t = SymbolTable::new("pkg");
            let int = t.types.basic(Int);
            let f = t.types.func(&[int], &[int], false);
            add(&mut t, "F", SymbolKind::Func, f);
            t
        };
        let variant = |params: &[BasicKind], results: &[BasicKind]| {
            let mut t = SymbolTable::new("pkg");
            let p: Vec<_> = params.iter().map(|&k| t.types.basic(k)).collect();
            let r: Vec<_> = results.iter().map(|&k| t.types.basic(k)).collect();
            let f = t.types.func(&p, &r, false);
            add(&mut t, "F", SymbolKind::Func, f);
            t
        };

        let before = base();
        for after in [
            variant(&[Int, Int], &[Int]),
            variant(&[Str], &[Int]),
            variant(&[Int], &[Int, Int]),
            variant(&[Int], &[Str]),
        ] {
            assert_eq!(find_breaking_removals(&before, &after).len(), 1);
        }
        assert!(find_breaking_removals(&before, &variant(&[Int], &[Int])).is_empty());
    }

    #[test]
    fn test_kind_changed() {
        // var V int -> func V()
        let mut before = SymbolTable::new("pkg");
        let int = before.types.basic(BasicKind::Int);
        add(&mut before, "V", SymbolKind::Var, int);
        let after = func_table("V", &[]);

        let findings = find_breaking_removals(&before, &after);
        assert_eq!(findings[0].change, ChangeKind::KindChanged);
    }

    #[test]
    fn test_kind_change_with_identical_type() {
        // var F func() -> func F()
        let mut before = SymbolTable::new("pkg");
        let f = before.types.func(&[], &[], false);
        add(&mut before, "F", SymbolKind::Var, f);
        let after = func_table("F", &[]);

        assert!(find_breaking_removals(&before, &after).is_empty());
        assert!(compatible(before.lookup("F").unwrap(), after.lookup("F")));
    }

    #[test]
    fn test_nested_struct_gaining_field() {
        // type Config struct{ A int }; func New() *Config
        let table = |fields: &[(&str, BasicKind)]| {
            let mut t = SymbolTable::new("pkg");
            let config = struct_type(&mut t.types, fields);
            let ptr = t.types.pointer(config);
            let new = t.types.func(&[], &[ptr], false);
            add(&mut t, "T", SymbolKind::Type, config);
            add(&mut t, "New", SymbolKind::Func, new);
            t
        };
        let before = table(&[("A", BasicKind::Int)]);
        let grown = table(&[("A", BasicKind::Int), ("B", BasicKind::Int)]);
        let shrunk = table(&[("B", BasicKind::Int)]);

        assert!(find_breaking_removals(&before, &grown).is_empty());
        let names: Vec<_> = find_breaking_removals(&before, &shrunk)
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["T", "New"]);
    }

    #[test]
    fn test_struct_became_non_struct() {
        let before = struct_table(&[("Foo", BasicKind::Int)]);
        let mut after = SymbolTable::new("pkg");
        let int = after.types.basic(BasicKind::Int);
        let t = after.types.named("T", int);
        add(&mut after, "T", SymbolKind::Type, t);

        let findings = find_breaking_removals(&before, &after);
        assert_eq!(findings[0].change, ChangeKind::KindChanged);
    }

    #[test]
    fn test_struct_policy_applied() {
        use BasicKind::{Int, String as Str};
        let before = struct_table(&[("Foo", Int)]);
        assert!(find_breaking_removals(&before, &struct_table(&[("Foo", Int), ("Bar", Str)])).is_empty());
        assert_eq!(
            find_breaking_removals(&before, &struct_table(&[("foo", Int), ("Foo", Int)])).len(),
            1
        );

        let mixed = struct_table(&[("foo", Int), ("Foo", Int)]);
        assert!(find_breaking_removals(
            &mixed,
            &struct_table(&[("Foo", Int), ("foo", Int), ("Bar", Str)])
        )
        .is_empty());
        let findings = find_breaking_removals(&mixed, &struct_table(&[("foo", Int)]));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].change, ChangeKind::TypeChanged);
        assert_eq!(findings[0].before.type_text, "struct{foo int; Foo int}");
    }

    #[test]
    fn test_interface_method_changes() {
        let iface = |names: &[&str]| {
            let mut t = SymbolTable::new("pkg");
            let sig = t.types.func(&[], &[], false);
            let methods = names
                .iter()
                .map(|n| Method {
                    name: n.to_string(),
                    sig,
                })
                .collect();
            let body = t.types.interface(methods, vec![]);
            let named = t.types.named("I", body);
            add(&mut t, "I", SymbolKind::Type, named);
            t
        };

        let before = iface(&["A", "B"]);
        assert!(find_breaking_removals(&before, &iface(&["B", "A"])).is_empty());
        assert_eq!(find_breaking_removals(&before, &iface(&["A"])).len(), 1);
        assert_eq!(find_breaking_removals(&before, &iface(&["A", "B", "C"])).len(), 1);
    }

    #[test]
    fn test_findings_follow_insertion_order() {
        let mut before = SymbolTable::new("pkg");
        let int = before.types.basic(BasicKind::Int);
        for name in ["Zed", "Alpha", "Mid"] {
            add(&mut before, name, SymbolKind::Const, int);
        }
        let after = SymbolTable::new("pkg");

        let names: Vec<_> = find_breaking_removals(&before, &after)
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["Zed", "Alpha", "Mid"]);
    }

    #[test]
    fn test_analyze_with_allowlist() {
        let mut before = SymbolTable::new("pkg");
        let int = before.types.basic(BasicKind::Int);
        add(&mut before, "LegacyA", SymbolKind::Var, int);
        add(&mut before, "Current", SymbolKind::Var, int);
        let after = SymbolTable::new("pkg");

        let allow = Allowlist::from_patterns(["Legacy.*"]).unwrap();
        let report = analyze_with(&before, &after, &allow);
        assert_eq!(report.names(), vec!["Current"]);
        assert_eq!(report.allowed.len(), 1);
        assert_eq!(report.summary.allowed, 1);
        assert_eq!(report.package, "pkg");
        assert!(report.is_breaking());

        let report = analyze(&before, &after);
        assert_eq!(report.findings.len(), 2);
    }
}
