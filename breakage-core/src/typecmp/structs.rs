//! Struct compatibility.
//!
//! A struct change is tolerated when every client that could be written
//! against the old struct still compiles. Clients can name exported fields
//! and, if the struct has no unexported fields, build values with unkeyed
//! composite literals; the rules below follow from those two uses.

use crate::types::{Field, TypeKind, TypeRef};

use super::identical;

/// Whether `new` can stand in for `old`, both being structs (possibly behind
/// named types).
///
/// - no fields, or no exported fields: anything goes, nothing was usable.
/// - only exported fields: positional literals are possible, so the old
///   field list must be a prefix of the new one, field by field. Anything
///   may be appended.
/// - a mix: positional literals are impossible, so every exported field
///   must survive by name; order is free.
///
/// A surviving field keeps its name, stays exported, keeps its embedded
/// flag (promotion of its fields and methods depends on it) and has an
/// identical type. Tags are free to change.
///
/// Callers check `is_struct` on both sides first; a non-struct argument is
/// treated as having no fields.
pub fn struct_compatible(old: TypeRef<'_>, new: TypeRef<'_>) -> bool {
    compatible_with(old, new, identical)
}

/// [`struct_compatible`] with field types compared by `same_type`, so that
/// identity can fall back to this rule without losing its cycle stacks.
pub(super) fn compatible_with<'g>(
    old: TypeRef<'g>,
    new: TypeRef<'g>,
    mut same_type: impl FnMut(TypeRef<'g>, TypeRef<'g>) -> bool,
) -> bool {
    let old_fields = fields(old);
    let new_fields = fields(new);
    let mut same_field = |o: &Field, n: &Field| {
        n.exported
            && o.name == n.name
            && o.embedded == n.embedded
            && same_type(old.at(o.ty), new.at(n.ty))
    };

    let exported = old_fields.iter().filter(|f| f.exported).count();
    if exported == 0 {
        return true;
    }

    if exported == old_fields.len() {
        return old_fields.len() <= new_fields.len()
            && old_fields
                .iter()
                .zip(new_fields)
                .all(|(o, n)| same_field(o, n));
    }

    old_fields.iter().filter(|f| f.exported).all(|o| {
        new_fields
            .iter()
            .find(|n| n.name == o.name)
            .is_some_and(|n| same_field(o, n))
    })
}

fn fields<'g>(ty: TypeRef<'g>) -> &'g [Field] {
    match ty.underlying().kind() {
        TypeKind::Struct { fields } => fields,
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BasicKind, TypeGraph, TypeId};

    /// Build a struct from `(name, kind)` pairs; lowercase names are
    /// unexported.
    fn build(g: &mut TypeGraph, fields: &[(&str, BasicKind)]) -> TypeId {
        let fields = fields
            .iter()
            .map(|&(name, kind)| {
                let ty = g.basic(kind);
                let exported = name.starts_with(|c: char| c.is_uppercase());
                Field::new(name, ty, exported)
            })
            .collect();
        g.structure(fields)
    }

    fn compatible(old: &[(&str, BasicKind)], new: &[(&str, BasicKind)]) -> bool {
        let mut a = TypeGraph::new();
        let mut b = TypeGraph::new();
        let x = build(&mut a, old);
        let y = build(&mut b, new);
        struct_compatible(a.at(x), b.at(y))
    }

    use BasicKind::{Int, String as Str};

    #[test]
    fn test_empty_old_struct() {
        assert!(compatible(&[], &[]));
        assert!(compatible(&[], &[("Foo", Int), ("bar", Int)]));
    }

    #[test]
    fn test_only_unexported_fields() {
        assert!(compatible(&[("foo", Int)], &[]));
        assert!(compatible(&[("foo", Int)], &[("bar", Str)]));
    }

    #[test]
    fn test_exported_prefix() {
        assert!(compatible(&[("Foo", Int)], &[("Foo", Int)]));
        assert!(compatible(&[("Foo", Int)], &[("Foo", Int), ("Bar", Int)]));
        assert!(compatible(&[("Foo", Int)], &[("Foo", Int), ("bar", Int)]));
    }

    #[test]
    fn test_exported_prefix_broken() {
        // Field inserted in front shifts positional literals.
        assert!(!compatible(&[("Foo", Int)], &[("foo", Int), ("Foo", Int)]));
        assert!(!compatible(&[("Foo", Int)], &[("Bar", Int), ("Foo", Int)]));
        // Reordered.
        assert!(!compatible(
            &[("Foo", Int), ("Bar", Int)],
            &[("Bar", Int), ("Foo", Int)]
        ));
        // Removed.
        assert!(!compatible(&[("Foo", Int), ("Bar", Int)], &[("Foo", Int)]));
        // Retyped.
        assert!(!compatible(&[("Foo", Int)], &[("Foo", Str)]));
    }

    #[test]
    fn test_mixed_fields_reorder_allowed() {
        assert!(compatible(
            &[("Foo", Int), ("bar", Int)],
            &[("baz", Str), ("Foo", Int)]
        ));
        assert!(compatible(
            &[("Foo", Int), ("bar", Int)],
            &[("Foo", Int)]
        ));
    }

    #[test]
    fn test_mixed_fields_require_every_exported() {
        // Every exported field is checked, not just the first one.
        assert!(!compatible(
            &[("Foo", Int), ("Bar", Int), ("baz", Int)],
            &[("Foo", Int), ("baz", Int)]
        ));
        assert!(!compatible(
            &[("Foo", Int), ("bar", Int)],
            &[("Foo", Str), ("bar", Int)]
        ));
    }

    #[test]
    fn test_unexporting_a_field_breaks() {
        assert!(!compatible(&[("Foo", Int), ("bar", Int)], &[("foo", Int), ("bar", Int)]));
    }

    #[test]
    fn test_embedded_flag_kept_tags_free() {
        let mut a = TypeGraph::new();
        let mut b = TypeGraph::new();
        let ai = a.basic(Int);
        let bi = b.basic(Int);
        let local = a.basic(Int);
        let old = a.structure(vec![
            Field::new("Base", ai, true).embedded(),
            Field::new("size", local, false),
        ]);
        let retagged = b.structure(vec![
            Field::new("Base", bi, true)
                .embedded()
                .with_tag("json:\"base\""),
        ]);
        let unembedded = b.structure(vec![Field::new("Base", bi, true)]);
        assert!(struct_compatible(a.at(old), b.at(retagged)));
        assert!(!struct_compatible(a.at(old), b.at(unembedded)));
    }

    #[test]
    fn test_named_struct_arguments() {
        let mut a = TypeGraph::new();
        let mut b = TypeGraph::new();
        let sa = build(&mut a, &[("Foo", Int)]);
        let sa = a.named("T", sa);
        let sb = build(&mut b, &[("Foo", Int), ("Bar", Int)]);
        let sb = b.named("T", sb);
        assert!(struct_compatible(a.at(sa), b.at(sb)));
    }
}
