//! Type descriptor graph.
//!
//! Descriptors live in an arena (`TypeGraph`) and refer to each other through
//! copyable `TypeId` indices. A named type's underlying slot may point back at
//! the named node itself (directly or through composites), which is how
//! recursive declarations such as `type Node struct { Next *Node }` are
//! represented without reference counting.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Index of a descriptor inside a `TypeGraph`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(u32);

impl TypeId {
    /// Position of the descriptor in its arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A location in a source file (1-indexed line and column).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Primitive type kinds.
///
/// Identity between basic types is decided by kind alone, so `byte` and
/// `uint8` (two distinct nodes) compare equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BasicKind {
    /// Type could not be determined.
    Invalid,
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    UnsafePointer,
    UntypedBool,
    UntypedInt,
    UntypedRune,
    UntypedFloat,
    UntypedComplex,
    UntypedString,
    UntypedNil,
}

impl BasicKind {
    /// Canonical spelling of the kind.
    pub fn name(self) -> &'static str {
        match self {
            BasicKind::Invalid => "invalid type",
            BasicKind::Bool => "bool",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::Complex64 => "complex64",
            BasicKind::Complex128 => "complex128",
            BasicKind::String => "string",
            BasicKind::UnsafePointer => "unsafe.Pointer",
            BasicKind::UntypedBool => "untyped bool",
            BasicKind::UntypedInt => "untyped int",
            BasicKind::UntypedRune => "untyped rune",
            BasicKind::UntypedFloat => "untyped float",
            BasicKind::UntypedComplex => "untyped complex",
            BasicKind::UntypedString => "untyped string",
            BasicKind::UntypedNil => "untyped nil",
        }
    }
}

/// Channel direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

/// A parameter or result entry. Names never take part in identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Var {
    pub name: String,
    pub ty: TypeId,
}

/// A struct field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: TypeId,
    pub exported: bool,
    pub embedded: bool,
    pub tag: String,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: TypeId, exported: bool) -> Self {
        Self {
            name: name.into(),
            ty,
            exported,
            embedded: false,
            tag: String::new(),
        }
    }

    /// Mark the field as embedded.
    pub fn embedded(mut self) -> Self {
        self.embedded = true;
        self
    }

    /// Attach a tag string.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }
}

/// An interface method. `sig` refers to a `Signature` node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    pub sig: TypeId,
}

/// One descriptor variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeKind {
    Basic {
        kind: BasicKind,
        name: &'static str,
    },
    Array {
        elem: TypeId,
        len: u64,
    },
    Slice {
        elem: TypeId,
    },
    Pointer {
        elem: TypeId,
    },
    /// Ordered parameter or result list.
    Tuple(Vec<Var>),
    Signature {
        params: TypeId,
        results: TypeId,
        variadic: bool,
    },
    /// Explicit methods plus embedded types; the full method set is
    /// computed on demand by `TypeGraph::method_set`.
    Interface {
        methods: Vec<Method>,
        embedded: Vec<TypeId>,
    },
    Map {
        key: TypeId,
        value: TypeId,
    },
    Chan {
        dir: ChanDir,
        elem: TypeId,
    },
    /// `None` only while a declaration is being resolved.
    Named {
        name: String,
        underlying: Option<TypeId>,
    },
    Struct {
        fields: Vec<Field>,
    },
    /// A type whose structure lives outside the snapshot (imported package
    /// types, generic instantiations, type parameters).
    Opaque {
        path: String,
    },
}

/// Arena of type descriptors for one snapshot.
#[derive(Clone, Debug, Default)]
pub struct TypeGraph {
    nodes: Vec<TypeKind>,
}

impl TypeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of descriptors in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a descriptor and return its id.
    pub fn add(&mut self, kind: TypeKind) -> TypeId {
        let id = TypeId(self.nodes.len() as u32);
        self.nodes.push(kind);
        id
    }

    /// Look up a descriptor.
    ///
    /// # Panics
    ///
    /// Panics if `id` was allocated by a different graph.
    pub fn get(&self, id: TypeId) -> &TypeKind {
        match self.nodes.get(id.index()) {
            Some(kind) => kind,
            None => panic!(
                "type id {} out of range for graph of {} descriptors",
                id.index(),
                self.nodes.len()
            ),
        }
    }

    pub fn basic(&mut self, kind: BasicKind) -> TypeId {
        self.add(TypeKind::Basic {
            kind,
            name: kind.name(),
        })
    }

    /// A basic type spelled differently from its kind (`byte`, `rune`).
    pub fn basic_alias(&mut self, kind: BasicKind, name: &'static str) -> TypeId {
        self.add(TypeKind::Basic { kind, name })
    }

    pub fn array(&mut self, elem: TypeId, len: u64) -> TypeId {
        self.add(TypeKind::Array { elem, len })
    }

    pub fn slice(&mut self, elem: TypeId) -> TypeId {
        self.add(TypeKind::Slice { elem })
    }

    pub fn pointer(&mut self, elem: TypeId) -> TypeId {
        self.add(TypeKind::Pointer { elem })
    }

    pub fn map(&mut self, key: TypeId, value: TypeId) -> TypeId {
        self.add(TypeKind::Map { key, value })
    }

    pub fn chan(&mut self, dir: ChanDir, elem: TypeId) -> TypeId {
        self.add(TypeKind::Chan { dir, elem })
    }

    pub fn tuple(&mut self, vars: Vec<Var>) -> TypeId {
        self.add(TypeKind::Tuple(vars))
    }

    /// Build a signature from unnamed parameter and result types.
    pub fn func(&mut self, params: &[TypeId], results: &[TypeId], variadic: bool) -> TypeId {
        let unnamed = |ids: &[TypeId]| {
            ids.iter()
                .map(|&ty| Var {
                    name: String::new(),
                    ty,
                })
                .collect()
        };
        let params = self.tuple(unnamed(params));
        let results = self.tuple(unnamed(results));
        self.signature(params, results, variadic)
    }

    pub fn signature(&mut self, params: TypeId, results: TypeId, variadic: bool) -> TypeId {
        self.add(TypeKind::Signature {
            params,
            results,
            variadic,
        })
    }

    pub fn interface(&mut self, methods: Vec<Method>, embedded: Vec<TypeId>) -> TypeId {
        self.add(TypeKind::Interface { methods, embedded })
    }

    pub fn structure(&mut self, fields: Vec<Field>) -> TypeId {
        self.add(TypeKind::Struct { fields })
    }

    pub fn opaque(&mut self, path: impl Into<String>) -> TypeId {
        self.add(TypeKind::Opaque { path: path.into() })
    }

    /// Declare a named type whose underlying type is filled in later with
    /// `set_underlying`.
    pub fn declare_named(&mut self, name: impl Into<String>) -> TypeId {
        self.add(TypeKind::Named {
            name: name.into(),
            underlying: None,
        })
    }

    /// Declare and define a named type in one step.
    pub fn named(&mut self, name: impl Into<String>, underlying: TypeId) -> TypeId {
        self.add(TypeKind::Named {
            name: name.into(),
            underlying: Some(underlying),
        })
    }

    /// Complete a named type declared with `declare_named`.
    pub fn set_underlying(&mut self, named: TypeId, target: TypeId) {
        match self.nodes.get_mut(named.index()) {
            Some(TypeKind::Named { underlying, .. }) => *underlying = Some(target),
            other => panic!("set_underlying on non-named descriptor {:?}", other),
        }
    }

    /// Follow named types down to their structural descriptor.
    ///
    /// # Panics
    ///
    /// Panics on a named type that was declared but never defined, or on a
    /// chain of named types that loops back on itself. Both are front-end
    /// invariant violations.
    pub fn underlying(&self, id: TypeId) -> TypeId {
        let mut current = id;
        for _ in 0..=self.nodes.len() {
            match self.get(current) {
                TypeKind::Named {
                    underlying: Some(next),
                    ..
                } => current = *next,
                TypeKind::Named {
                    name,
                    underlying: None,
                } => panic!("named type {} has no underlying type", name),
                _ => return current,
            }
        }
        panic!("named type chain starting at {} never terminates", id.index())
    }

    /// Whether the descriptor's underlying type is a struct.
    pub fn is_struct(&self, id: TypeId) -> bool {
        matches!(self.get(self.underlying(id)), TypeKind::Struct { .. })
    }

    /// Complete method set of an interface, sorted by name.
    ///
    /// Embedded interfaces are merged in; embedding cycles are cut, and
    /// embedded non-interface types (type-set terms) contribute no methods.
    pub fn method_set(&self, id: TypeId) -> Vec<&Method> {
        let mut methods = Vec::new();
        let mut seen = HashSet::new();
        self.collect_methods(id, &mut methods, &mut seen);
        methods.sort_by(|a, b| a.name.cmp(&b.name));
        methods.dedup_by(|a, b| a.name == b.name);
        methods
    }

    fn collect_methods<'a>(
        &'a self,
        id: TypeId,
        methods: &mut Vec<&'a Method>,
        seen: &mut HashSet<TypeId>,
    ) {
        let id = self.underlying(id);
        if !seen.insert(id) {
            return;
        }
        if let TypeKind::Interface {
            methods: own,
            embedded,
        } = self.get(id)
        {
            methods.extend(own.iter());
            for &inner in embedded {
                self.collect_methods(inner, methods, seen);
            }
        }
    }

    /// Borrow a descriptor together with this graph.
    pub fn at(&self, id: TypeId) -> TypeRef<'_> {
        TypeRef { graph: self, id }
    }
}

/// A descriptor handle: graph plus id.
///
/// Two refs are equal only when they name the same node of the same arena,
/// which is the "same descriptor instance" test used by the comparator.
#[derive(Clone, Copy, Debug)]
pub struct TypeRef<'g> {
    pub graph: &'g TypeGraph,
    pub id: TypeId,
}

impl<'g> TypeRef<'g> {
    pub fn kind(self) -> &'g TypeKind {
        self.graph.get(self.id)
    }

    /// Another node of the same graph.
    pub fn at(self, id: TypeId) -> TypeRef<'g> {
        TypeRef {
            graph: self.graph,
            id,
        }
    }

    pub fn underlying(self) -> TypeRef<'g> {
        self.at(self.graph.underlying(self.id))
    }

    pub fn is_struct(self) -> bool {
        self.graph.is_struct(self.id)
    }
}

impl PartialEq for TypeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.graph, other.graph) && self.id == other.id
    }
}

impl Eq for TypeRef<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_underlying_follows_named_chain() {
        let mut g = TypeGraph::new();
        let int = g.basic(BasicKind::Int);
        let a = g.named("A", int);
        let b = g.named("B", a);
        assert_eq!(g.underlying(b), int);
        assert_eq!(g.underlying(int), int);
    }

    #[test]
    fn test_is_struct_through_named() {
        let mut g = TypeGraph::new();
        let s = g.structure(vec![]);
        let t = g.named("T", s);
        let int = g.basic(BasicKind::Int);
        assert!(g.is_struct(t));
        assert!(!g.is_struct(int));
    }

    #[test]
    #[should_panic(expected = "has no underlying type")]
    fn test_undefined_named_panics() {
        let mut g = TypeGraph::new();
        let t = g.declare_named("T");
        g.underlying(t);
    }

    #[test]
    fn test_method_set_merges_embedded_sorted() {
        let mut g = TypeGraph::new();
        let sig = g.func(&[], &[], false);
        let reader = g.interface(
            vec![Method {
                name: "Read".to_string(),
                sig,
            }],
            vec![],
        );
        let reader = g.named("Reader", reader);
        let rc = g.interface(
            vec![Method {
                name: "Close".to_string(),
                sig,
            }],
            vec![reader],
        );

        let names: Vec<_> = g.method_set(rc).iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Close", "Read"]);
    }

    #[test]
    fn test_method_set_cuts_embedding_cycles() {
        let mut g = TypeGraph::new();
        let t = g.declare_named("T");
        let sig = g.func(&[], &[], false);
        let body = g.interface(
            vec![Method {
                name: "M".to_string(),
                sig,
            }],
            vec![t],
        );
        g.set_underlying(t, body);
        assert_eq!(g.method_set(t).len(), 1);
    }

    #[test]
    fn test_type_ref_equality_is_per_graph() {
        let mut g1 = TypeGraph::new();
        let mut g2 = TypeGraph::new();
        let a = g1.basic(BasicKind::Int);
        let b = g2.basic(BasicKind::Int);
        assert_eq!(a, b);
        assert_eq!(g1.at(a), g1.at(a));
        assert_ne!(g1.at(a), g2.at(b));
    }

    #[test]
    fn test_position_display() {
        assert_eq!(Position::new("a.go", 4, 6).to_string(), "a.go:4:6");
    }
}
