//! Owned declaration syntax extracted from tree-sitter trees.
//!
//! Tree-sitter nodes borrow their tree, so each file is lowered into these
//! plain structures on a worker thread and resolved afterwards.

use crate::types::{ChanDir, Position};

/// An identifier occurrence.
#[derive(Clone, Debug, PartialEq)]
pub struct Ident {
    pub name: String,
    pub position: Position,
}

/// One parsed source file.
#[derive(Clone, Debug, Default)]
pub struct File {
    pub path: String,
    pub package: String,
    pub imports: Vec<Import>,
    pub decls: Vec<Decl>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Import {
    /// Explicit import name (`f "fmt"`, `.`, `_`).
    pub name: Option<String>,
    pub path: String,
}

impl Import {
    /// Name the import is referred to by inside the file.
    pub fn local_name(&self) -> &str {
        match &self.name {
            Some(name) => name,
            None => self.path.rsplit('/').next().unwrap_or(&self.path),
        }
    }
}

/// A top-level declaration.
#[derive(Clone, Debug)]
pub enum Decl {
    Const(ValueSpec),
    Var(ValueSpec),
    Func(FuncDecl),
    Type(TypeSpec),
}

/// One `const` or `var` spec. Const specs without values already carry the
/// type and values repeated from the previous spec of their group.
#[derive(Clone, Debug)]
pub struct ValueSpec {
    pub names: Vec<Ident>,
    pub ty: Option<TypeExpr>,
    pub values: Vec<Expr>,
    /// Index of the spec inside its declaration group.
    pub iota: u64,
}

#[derive(Clone, Debug)]
pub struct FuncDecl {
    pub name: Ident,
    pub type_params: Vec<String>,
    pub sig: FuncType,
}

#[derive(Clone, Debug)]
pub struct TypeSpec {
    pub name: Ident,
    /// `type A = B`
    pub alias: bool,
    pub type_params: Vec<String>,
    pub ty: TypeExpr,
}

/// A type expression.
#[derive(Clone, Debug)]
pub enum TypeExpr {
    Name(Ident),
    Qualified {
        package: String,
        name: String,
        position: Position,
    },
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    Array {
        len: Box<Expr>,
        /// Source text of the length, for diagnostics.
        len_text: String,
        position: Position,
        elem: Box<TypeExpr>,
    },
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    Chan {
        dir: ChanDir,
        elem: Box<TypeExpr>,
    },
    Func(FuncType),
    Struct(Vec<FieldDecl>),
    Interface(Vec<InterfaceElem>),
    /// An instantiated generic type, kept as normalized source text.
    Generic(String),
}

#[derive(Clone, Debug)]
pub struct FuncType {
    pub params: Vec<Param>,
    pub results: Vec<Param>,
    pub variadic: bool,
}

/// A parameter or result. The type of a variadic parameter is the element
/// type as written (`...T` stores `T`).
#[derive(Clone, Debug)]
pub struct Param {
    pub name: String,
    pub ty: TypeExpr,
}

#[derive(Clone, Debug)]
pub struct FieldDecl {
    /// Empty for embedded fields.
    pub names: Vec<String>,
    pub ty: TypeExpr,
    /// Embedded through a pointer (`*T`).
    pub pointer: bool,
    pub tag: String,
}

impl FieldDecl {
    pub fn is_embedded(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Clone, Debug)]
pub enum InterfaceElem {
    Method { name: String, sig: FuncType },
    Embed(TypeExpr),
    /// Unions and approximation terms; they restrict type sets only.
    Constraint(String),
}

/// The constant and initializer expressions the resolver understands.
#[derive(Clone, Debug)]
pub enum Expr {
    Int(String),
    Float(String),
    Imaginary(String),
    Rune(String),
    Str(String),
    Bool(bool),
    Nil,
    Iota,
    Name(Ident),
    Selector {
        package: String,
        name: String,
    },
    Unary {
        op: String,
        operand: Box<Expr>,
    },
    Binary {
        op: String,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
    },
    Conversion {
        ty: TypeExpr,
        operand: Box<Expr>,
    },
    Composite(TypeExpr),
    FuncLit(FuncType),
    Other(String),
}
