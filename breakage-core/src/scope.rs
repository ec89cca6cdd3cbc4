//! Symbols and per-snapshot symbol tables.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::types::{Position, TypeGraph, TypeId, TypeRef};

/// What a top-level name declares.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Const,
    Var,
    Func,
    Type,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Const => "const",
            SymbolKind::Var => "var",
            SymbolKind::Func => "func",
            SymbolKind::Type => "type",
        }
    }
}

/// A top-level declared entity.
#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: TypeId,
    /// Whether the symbol is part of the public contract. Computed by the
    /// front end; never derived from the name here.
    pub exported: bool,
    pub position: Option<Position>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind, ty: TypeId, exported: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            ty,
            exported,
            position: None,
        }
    }

    /// Set the declaration position.
    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }
}

/// Ordered name to symbol mapping for one snapshot, owning the descriptor
/// graph its symbols point into.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    /// Package (or module) name, informational only.
    pub package: String,
    pub types: TypeGraph,
    symbols: Vec<Symbol>,
    index: HashMap<String, usize>,
}

impl SymbolTable {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            ..Default::default()
        }
    }

    /// Create a table around an existing graph.
    pub fn with_types(package: impl Into<String>, types: TypeGraph) -> Self {
        Self {
            package: package.into(),
            types,
            ..Default::default()
        }
    }

    /// Append a symbol. Names must be unique within a table.
    pub fn insert(&mut self, symbol: Symbol) -> Result<()> {
        if self.index.contains_key(&symbol.name) {
            return Err(Error::DuplicateSymbol { name: symbol.name });
        }
        self.index.insert(symbol.name.clone(), self.symbols.len());
        self.symbols.push(symbol);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<SymbolRef<'_>> {
        self.index.get(name).map(|&i| SymbolRef {
            table: self,
            symbol: &self.symbols[i],
        })
    }

    /// Symbols in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = SymbolRef<'_>> {
        self.symbols.iter().map(move |symbol| SymbolRef {
            table: self,
            symbol,
        })
    }

    /// Names in insertion order.
    pub fn names(&self) -> Vec<&str> {
        self.symbols.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// A symbol borrowed together with the table whose graph it lives in.
#[derive(Clone, Copy, Debug)]
pub struct SymbolRef<'t> {
    pub table: &'t SymbolTable,
    pub symbol: &'t Symbol,
}

impl<'t> SymbolRef<'t> {
    pub fn name(&self) -> &'t str {
        &self.symbol.name
    }

    pub fn kind(&self) -> SymbolKind {
        self.symbol.kind
    }

    pub fn exported(&self) -> bool {
        self.symbol.exported
    }

    pub fn ty(&self) -> TypeRef<'t> {
        self.table.types.at(self.symbol.ty)
    }

    pub fn position(&self) -> Option<&'t Position> {
        self.symbol.position.as_ref()
    }
}
