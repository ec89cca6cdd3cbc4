//! Package-scope resolution.
//!
//! Turns the declarations of all files of one package into a symbol table.
//! Named types are declared before any definition is resolved, so
//! declarations may refer to each other in any order and recursive types
//! close their cycles through the named node. Constants, variables and
//! aliases are resolved lazily on first reference, with an in-progress
//! marker to reject cycles.

use std::collections::{HashMap, HashSet};

use super::ast::{
    Decl, Expr, FieldDecl, File, FuncDecl, FuncType, Ident, InterfaceElem, TypeExpr, TypeSpec,
    ValueSpec,
};
use super::helpers::is_exported;
use crate::error::{Error, Result};
use crate::scope::{Symbol, SymbolKind, SymbolTable};
use crate::types::{BasicKind, Field, Method, Position, TypeGraph, TypeId, TypeKind, Var};

/// Resolve the files of one package into a symbol table.
///
/// Files are resolved in the order given; symbols are inserted in file
/// order, then source order.
pub fn resolve(package: &str, files: &[File]) -> Result<SymbolTable> {
    let mut resolver = Resolver::new(files);
    resolver.collect()?;
    resolver.define_types()?;
    let symbols = resolver.symbols()?;

    let mut table = SymbolTable::with_types(package, resolver.graph);
    for symbol in symbols {
        table.insert(symbol)?;
    }
    Ok(table)
}

/// Lazy resolution state.
enum State<T> {
    Resolving,
    Done(T),
}

/// A declaration together with the index of its file, needed to look up
/// the file's imports.
struct Located<'a, T> {
    item: &'a T,
    file: usize,
}

impl<T> Clone for Located<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Located<'_, T> {}

/// One name of a const or var spec.
#[derive(Clone, Copy)]
struct ValueDecl<'a> {
    spec: &'a ValueSpec,
    index: usize,
    file: usize,
}

impl<'a> ValueDecl<'a> {
    fn name(&self) -> &'a str {
        &self.spec.names[self.index].name
    }

    /// The initializer of this name, when each name has its own.
    fn value(&self) -> Option<&'a Expr> {
        if self.spec.values.len() == self.spec.names.len() {
            self.spec.values.get(self.index)
        } else {
            None
        }
    }
}

/// Compile-time value of a constant expression.
#[derive(Clone, Debug, PartialEq)]
enum Value {
    Int(i128),
    Float(f64),
    Bool(bool),
    Str(String),
    Unknown,
}

#[derive(Clone, Debug)]
struct Constant {
    value: Value,
    ty: TypeId,
}

struct Resolver<'a> {
    files: &'a [File],
    graph: TypeGraph,
    universe: HashMap<&'static str, TypeId>,
    basics: HashMap<BasicKind, TypeId>,

    named: HashMap<&'a str, TypeId>,
    aliases: HashMap<&'a str, Located<'a, TypeSpec>>,
    consts: HashMap<&'a str, ValueDecl<'a>>,
    vars: HashMap<&'a str, ValueDecl<'a>>,
    funcs: HashMap<&'a str, Located<'a, FuncDecl>>,

    alias_state: HashMap<&'a str, State<TypeId>>,
    const_state: HashMap<&'a str, State<Constant>>,
    var_state: HashMap<&'a str, State<TypeId>>,
    func_types: HashMap<&'a str, TypeId>,

    /// File whose imports are in scope.
    file: usize,
    type_params: Vec<(String, TypeId)>,
    iota: Option<u64>,
}

impl<'a> Resolver<'a> {
    fn new(files: &'a [File]) -> Self {
        let mut resolver = Self {
            files,
            graph: TypeGraph::new(),
            universe: HashMap::new(),
            basics: HashMap::new(),
            named: HashMap::new(),
            aliases: HashMap::new(),
            consts: HashMap::new(),
            vars: HashMap::new(),
            funcs: HashMap::new(),
            alias_state: HashMap::new(),
            const_state: HashMap::new(),
            var_state: HashMap::new(),
            func_types: HashMap::new(),
            file: 0,
            type_params: Vec::new(),
            iota: None,
        };
        resolver.populate_universe();
        resolver
    }

    fn populate_universe(&mut self) {
        use BasicKind::*;
        for kind in [
            Bool, Int, Int8, Int16, Int32, Int64, Uint, Uint8, Uint16, Uint32, Uint64, Uintptr,
            Float32, Float64, Complex64, Complex128, String,
        ] {
            let id = self.basic(kind);
            self.universe.insert(kind.name(), id);
        }
        let byte = self.graph.basic_alias(Uint8, "byte");
        let rune = self.graph.basic_alias(Int32, "rune");
        self.universe.insert("byte", byte);
        self.universe.insert("rune", rune);

        let string = self.basic(String);
        let sig = self.graph.func(&[], &[string], false);
        let body = self.graph.interface(
            vec![Method {
                name: "Error".to_string(),
                sig,
            }],
            vec![],
        );
        let error = self.graph.named("error", body);
        self.universe.insert("error", error);

        let any = self.graph.interface(vec![], vec![]);
        self.universe.insert("any", any);
        let comparable = self.graph.opaque("comparable");
        self.universe.insert("comparable", comparable);
    }

    /// Shared node for a basic kind.
    fn basic(&mut self, kind: BasicKind) -> TypeId {
        if let Some(&id) = self.basics.get(&kind) {
            return id;
        }
        let id = self.graph.basic(kind);
        self.basics.insert(kind, id);
        id
    }

    /// Index every package-level name and declare named types.
    fn collect(&mut self) -> Result<()> {
        let files = self.files;
        let mut declared = HashSet::new();
        let mut claim = |name: &'a str| -> Result<bool> {
            if name == "_" {
                return Ok(false);
            }
            if !declared.insert(name) {
                return Err(Error::DuplicateSymbol {
                    name: name.to_string(),
                });
            }
            Ok(true)
        };

        for (file, ast) in files.iter().enumerate() {
            for decl in &ast.decls {
                match decl {
                    Decl::Type(spec) => {
                        if !claim(&spec.name.name)? {
                            continue;
                        }
                        if spec.alias {
                            self.aliases
                                .insert(&spec.name.name, Located { item: spec, file });
                        } else {
                            let id = self.graph.declare_named(spec.name.name.clone());
                            self.named.insert(&spec.name.name, id);
                        }
                    }
                    Decl::Func(func) => {
                        // init may be declared many times and is never callable.
                        if func.name.name == "init" || !claim(&func.name.name)? {
                            continue;
                        }
                        self.funcs
                            .insert(&func.name.name, Located { item: func, file });
                    }
                    Decl::Const(spec) | Decl::Var(spec) => {
                        for (index, ident) in spec.names.iter().enumerate() {
                            if !claim(&ident.name)? {
                                continue;
                            }
                            let value = ValueDecl { spec, index, file };
                            if matches!(decl, Decl::Const(_)) {
                                self.consts.insert(&ident.name, value);
                            } else {
                                self.vars.insert(&ident.name, value);
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Resolve the definition of every named type, then reject named types
    /// defined only in terms of each other.
    fn define_types(&mut self) -> Result<()> {
        let files = self.files;
        for (file, ast) in files.iter().enumerate() {
            for decl in &ast.decls {
                let Decl::Type(spec) = decl else {
                    continue;
                };
                let Some(&id) = self.named.get(spec.name.name.as_str()) else {
                    continue;
                };
                let target = self.in_decl(file, &spec.type_params, None, |r| {
                    r.resolve_type(&spec.ty)
                })?;
                self.graph.set_underlying(id, target);
                tracing::debug!(name = %spec.name.name, "defined type");
            }
        }
        self.check_named_cycles()
    }

    fn check_named_cycles(&self) -> Result<()> {
        for (&name, &start) in &self.named {
            let mut seen = HashSet::new();
            let mut current = start;
            while let TypeKind::Named {
                underlying: Some(next),
                ..
            } = self.graph.get(current)
            {
                if !seen.insert(current) {
                    return Err(Error::InvalidRecursiveType {
                        name: name.to_string(),
                    });
                }
                current = *next;
            }
            if self.contains_by_value(start) {
                return Err(Error::InvalidRecursiveType {
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Whether `start` reaches itself through struct fields and array
    /// elements alone, which would give it infinite size.
    fn contains_by_value(&self, start: TypeId) -> bool {
        let parts = |id: TypeId| -> Vec<TypeId> {
            match self.graph.get(id) {
                TypeKind::Named {
                    underlying: Some(next),
                    ..
                } => vec![*next],
                TypeKind::Struct { fields } => fields.iter().map(|f| f.ty).collect(),
                TypeKind::Array { elem, .. } => vec![*elem],
                _ => Vec::new(),
            }
        };

        let mut seen = HashSet::new();
        let mut pending = parts(start);
        while let Some(id) = pending.pop() {
            if id == start {
                return true;
            }
            if seen.insert(id) {
                pending.extend(parts(id));
            }
        }
        false
    }

    /// Run `f` in the scope of a declaration: its file's imports, its type
    /// parameters and its iota.
    fn in_decl<T>(
        &mut self,
        file: usize,
        params: &[String],
        iota: Option<u64>,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let saved_file = std::mem::replace(&mut self.file, file);
        let saved_params = std::mem::take(&mut self.type_params);
        let saved_iota = std::mem::replace(&mut self.iota, iota);
        for param in params {
            let id = self.graph.opaque(param.clone());
            self.type_params.push((param.clone(), id));
        }

        let result = f(self);

        self.file = saved_file;
        self.type_params = saved_params;
        self.iota = saved_iota;
        result
    }

    /// Package symbols in file order, then source order.
    fn symbols(&mut self) -> Result<Vec<Symbol>> {
        let files = self.files;
        let mut symbols = Vec::new();
        for ast in files {
            for decl in &ast.decls {
                match decl {
                    Decl::Type(spec) => {
                        let name = spec.name.name.as_str();
                        let ty = match self.named.get(name) {
                            Some(&id) => id,
                            None if name == "_" => continue,
                            None => self.resolve_alias(name)?,
                        };
                        symbols.push(symbol(&spec.name, SymbolKind::Type, ty));
                    }
                    Decl::Func(func) => {
                        let name = func.name.name.as_str();
                        if name == "init" || name == "_" {
                            continue;
                        }
                        let ty = self.resolve_func(name)?;
                        symbols.push(symbol(&func.name, SymbolKind::Func, ty));
                    }
                    Decl::Const(spec) => {
                        for ident in spec.names.iter().filter(|i| i.name != "_") {
                            let ty = self.resolve_const(&ident.name)?.ty;
                            symbols.push(symbol(ident, SymbolKind::Const, ty));
                        }
                    }
                    Decl::Var(spec) => {
                        for ident in spec.names.iter().filter(|i| i.name != "_") {
                            let ty = self.resolve_var(&ident.name)?;
                            symbols.push(symbol(ident, SymbolKind::Var, ty));
                        }
                    }
                }
            }
        }
        Ok(symbols)
    }

    // Types

    fn resolve_type(&mut self, expr: &'a TypeExpr) -> Result<TypeId> {
        match expr {
            TypeExpr::Name(ident) => match self.type_name(&ident.name) {
                Some(found) => found,
                None => Err(Error::UndefinedType {
                    name: ident.name.clone(),
                    position: ident.position.clone(),
                }),
            },
            TypeExpr::Qualified {
                package,
                name,
                position,
            } => self.qualified(package, name, position),
            TypeExpr::Pointer(elem) => {
                let elem = self.resolve_type(elem)?;
                Ok(self.graph.pointer(elem))
            }
            TypeExpr::Slice(elem) => {
                let elem = self.resolve_type(elem)?;
                Ok(self.graph.slice(elem))
            }
            TypeExpr::Array {
                len,
                len_text,
                position,
                elem,
            } => {
                let len = match self.constant(len)?.value {
                    Value::Int(n) => match u64::try_from(n) {
                        Ok(n) if n <= i64::MAX as u64 => n,
                        _ => {
                            return Err(Error::InvalidArrayLength {
                                expr: len_text.clone(),
                                position: position.clone(),
                            })
                        }
                    },
                    _ => {
                        return Err(Error::NonConstantLength {
                            expr: len_text.clone(),
                            position: position.clone(),
                        })
                    }
                };
                let elem = self.resolve_type(elem)?;
                Ok(self.graph.array(elem, len))
            }
            TypeExpr::Map { key, value } => {
                let key = self.resolve_type(key)?;
                let value = self.resolve_type(value)?;
                Ok(self.graph.map(key, value))
            }
            TypeExpr::Chan { dir, elem } => {
                let elem = self.resolve_type(elem)?;
                Ok(self.graph.chan(*dir, elem))
            }
            TypeExpr::Func(func) => self.signature(func),
            TypeExpr::Struct(fields) => self.structure(fields),
            TypeExpr::Interface(elems) => self.interface(elems),
            TypeExpr::Generic(text) => Ok(self.graph.opaque(text.clone())),
        }
    }

    /// Look a type name up in scope order: type parameters, package, universe.
    /// `None` when the name does not denote a type.
    fn type_name(&mut self, name: &str) -> Option<Result<TypeId>> {
        if let Some((_, id)) = self.type_params.iter().rev().find(|(p, _)| p == name) {
            return Some(Ok(*id));
        }
        if let Some(&id) = self.named.get(name) {
            return Some(Ok(id));
        }
        if self.aliases.contains_key(name) {
            return Some(self.resolve_alias(name));
        }
        self.universe.get(name).map(|&id| Ok(id))
    }

    fn qualified(&mut self, package: &str, name: &str, position: &Position) -> Result<TypeId> {
        let files = self.files;
        let import = files[self.file]
            .imports
            .iter()
            .find(|i| i.local_name() == package);
        match import {
            Some(import) if import.path == "unsafe" && name == "Pointer" => {
                Ok(self.basic(BasicKind::UnsafePointer))
            }
            Some(import) => {
                let path = format!("{}.{}", import.path, name);
                Ok(self.graph.opaque(path))
            }
            None => Err(Error::UndefinedType {
                name: format!("{}.{}", package, name),
                position: position.clone(),
            }),
        }
    }

    fn resolve_alias(&mut self, name: &str) -> Result<TypeId> {
        match self.alias_state.get(name) {
            Some(State::Done(id)) => return Ok(*id),
            Some(State::Resolving) => {
                return Err(Error::InvalidRecursiveType {
                    name: name.to_string(),
                })
            }
            None => {}
        }
        let Some(&Located { item: spec, file }) = self.aliases.get(name) else {
            return Err(Error::InvalidRecursiveType {
                name: name.to_string(),
            });
        };
        let key = spec.name.name.as_str();
        self.alias_state.insert(key, State::Resolving);
        let id = self.in_decl(file, &spec.type_params, None, |r| r.resolve_type(&spec.ty))?;
        self.alias_state.insert(key, State::Done(id));
        Ok(id)
    }

    fn signature(&mut self, func: &'a FuncType) -> Result<TypeId> {
        let mut params = Vec::with_capacity(func.params.len());
        for (i, param) in func.params.iter().enumerate() {
            let mut ty = self.resolve_type(&param.ty)?;
            if func.variadic && i + 1 == func.params.len() {
                ty = self.graph.slice(ty);
            }
            params.push(Var {
                name: param.name.clone(),
                ty,
            });
        }
        let mut results = Vec::with_capacity(func.results.len());
        for result in &func.results {
            results.push(Var {
                name: result.name.clone(),
                ty: self.resolve_type(&result.ty)?,
            });
        }
        let params = self.graph.tuple(params);
        let results = self.graph.tuple(results);
        Ok(self.graph.signature(params, results, func.variadic))
    }

    fn structure(&mut self, decls: &'a [FieldDecl]) -> Result<TypeId> {
        let mut fields = Vec::new();
        for decl in decls {
            let mut ty = self.resolve_type(&decl.ty)?;
            if decl.pointer {
                ty = self.graph.pointer(ty);
            }
            if decl.is_embedded() {
                let name = embedded_name(&decl.ty);
                fields.push(
                    Field::new(name, ty, is_exported(name))
                        .embedded()
                        .with_tag(decl.tag.clone()),
                );
            } else {
                fields.extend(decl.names.iter().map(|name| {
                    Field::new(name.clone(), ty, is_exported(name)).with_tag(decl.tag.clone())
                }));
            }
        }
        Ok(self.graph.structure(fields))
    }

    fn interface(&mut self, elems: &'a [InterfaceElem]) -> Result<TypeId> {
        let mut methods = Vec::new();
        let mut embedded = Vec::new();
        for elem in elems {
            match elem {
                InterfaceElem::Method { name, sig } => methods.push(Method {
                    name: name.clone(),
                    sig: self.signature(sig)?,
                }),
                InterfaceElem::Embed(ty) => embedded.push(self.resolve_type(ty)?),
                InterfaceElem::Constraint(text) => {
                    tracing::debug!(constraint = %text, "ignoring type-set term");
                }
            }
        }
        Ok(self.graph.interface(methods, embedded))
    }

    // Values

    fn resolve_func(&mut self, name: &str) -> Result<TypeId> {
        if let Some(&id) = self.func_types.get(name) {
            return Ok(id);
        }
        let Some(&Located { item: func, file }) = self.funcs.get(name) else {
            return Ok(self.basic(BasicKind::Invalid));
        };
        let id = self.in_decl(file, &func.type_params, None, |r| r.signature(&func.sig))?;
        self.func_types.insert(func.name.name.as_str(), id);
        Ok(id)
    }

    fn resolve_const(&mut self, name: &str) -> Result<Constant> {
        match self.const_state.get(name) {
            Some(State::Done(c)) => return Ok(c.clone()),
            Some(State::Resolving) => {
                return Err(Error::InitializationCycle {
                    name: name.to_string(),
                })
            }
            None => {}
        }
        let Some(&decl) = self.consts.get(name) else {
            return Ok(self.unknown());
        };
        let key = decl.name();
        self.const_state.insert(key, State::Resolving);
        let constant = self.in_decl(decl.file, &[], Some(decl.spec.iota), |r| {
            let mut constant = match decl.value() {
                Some(expr) => r.constant(expr)?,
                None => r.unknown(),
            };
            if let Some(ty) = &decl.spec.ty {
                constant.ty = r.resolve_type(ty)?;
            }
            Ok(constant)
        })?;
        self.const_state
            .insert(key, State::Done(constant.clone()));
        Ok(constant)
    }

    fn resolve_var(&mut self, name: &str) -> Result<TypeId> {
        match self.var_state.get(name) {
            Some(State::Done(id)) => return Ok(*id),
            Some(State::Resolving) => {
                return Err(Error::InitializationCycle {
                    name: name.to_string(),
                })
            }
            None => {}
        }
        let Some(&decl) = self.vars.get(name) else {
            return Ok(self.basic(BasicKind::Invalid));
        };
        let key = decl.name();
        self.var_state.insert(key, State::Resolving);
        let ty = self.in_decl(decl.file, &[], None, |r| match (&decl.spec.ty, decl.value()) {
            (Some(ty), _) => r.resolve_type(ty),
            (None, Some(expr)) => {
                let ty = r.constant(expr)?.ty;
                Ok(r.default_type(ty))
            }
            (None, None) => Ok(r.basic(BasicKind::Invalid)),
        })?;
        if matches!(
            self.graph.get(ty),
            TypeKind::Basic {
                kind: BasicKind::Invalid,
                ..
            }
        ) {
            let position = &decl.spec.names[decl.index].position;
            tracing::warn!(name = key, %position, "could not infer variable type");
        }
        self.var_state.insert(key, State::Done(ty));
        Ok(ty)
    }

    fn unknown(&mut self) -> Constant {
        Constant {
            value: Value::Unknown,
            ty: self.basic(BasicKind::Invalid),
        }
    }

    fn untyped(&mut self, value: Value, kind: BasicKind) -> Constant {
        Constant {
            value,
            ty: self.basic(kind),
        }
    }

    fn untyped_kind(&self, ty: TypeId) -> Option<BasicKind> {
        match self.graph.get(ty) {
            TypeKind::Basic { kind, .. } if untyped_rank(*kind).is_some() => Some(*kind),
            _ => None,
        }
    }

    /// Type a variable gets from an untyped initializer.
    fn default_type(&mut self, ty: TypeId) -> TypeId {
        let kind = match self.untyped_kind(ty) {
            Some(BasicKind::UntypedBool) => BasicKind::Bool,
            Some(BasicKind::UntypedInt) => BasicKind::Int,
            Some(BasicKind::UntypedRune) => return self.universe["rune"],
            Some(BasicKind::UntypedFloat) => BasicKind::Float64,
            Some(BasicKind::UntypedComplex) => BasicKind::Complex128,
            Some(BasicKind::UntypedString) => BasicKind::String,
            Some(_) => BasicKind::Invalid,
            None => return ty,
        };
        self.basic(kind)
    }

    /// Evaluate an expression far enough to know its type, and its value
    /// when it is an integer, float, bool or string constant.
    fn constant(&mut self, expr: &'a Expr) -> Result<Constant> {
        Ok(match expr {
            Expr::Int(text) => match parse_int(text) {
                Some(n) => self.untyped(Value::Int(n), BasicKind::UntypedInt),
                None => self.untyped(Value::Unknown, BasicKind::UntypedInt),
            },
            Expr::Float(text) => {
                let value = text
                    .replace('_', "")
                    .parse()
                    .map(Value::Float)
                    .unwrap_or(Value::Unknown);
                self.untyped(value, BasicKind::UntypedFloat)
            }
            Expr::Imaginary(_) => self.untyped(Value::Unknown, BasicKind::UntypedComplex),
            Expr::Rune(text) => {
                let value = rune_value(text).map_or(Value::Unknown, Value::Int);
                self.untyped(value, BasicKind::UntypedRune)
            }
            Expr::Str(s) => self.untyped(Value::Str(s.clone()), BasicKind::UntypedString),
            Expr::Bool(b) => self.untyped(Value::Bool(*b), BasicKind::UntypedBool),
            Expr::Nil => self.untyped(Value::Unknown, BasicKind::UntypedNil),
            Expr::Iota => match self.iota {
                Some(n) => self.untyped(Value::Int(n as i128), BasicKind::UntypedInt),
                None => self.unknown(),
            },
            Expr::Name(ident) => self.named_value(ident)?,
            Expr::Selector { .. } => self.unknown(),
            Expr::Unary { op, operand } => {
                let c = self.constant(operand)?;
                match op.as_str() {
                    "&" => {
                        let ty = self.graph.pointer(c.ty);
                        Constant {
                            value: Value::Unknown,
                            ty,
                        }
                    }
                    "<-" => self.unknown(),
                    _ => Constant {
                        value: unary(op, c.value),
                        ty: c.ty,
                    },
                }
            }
            Expr::Binary { op, left, right } => {
                let l = self.constant(left)?;
                let r = self.constant(right)?;
                let ty = match op.as_str() {
                    "==" | "!=" | "<" | "<=" | ">" | ">=" | "&&" | "||" => {
                        self.basic(BasicKind::UntypedBool)
                    }
                    "<<" | ">>" => l.ty,
                    _ => self.binary_type(l.ty, r.ty),
                };
                Constant {
                    value: binary(op, l.value, r.value),
                    ty,
                }
            }
            Expr::Call { func, args } => self.call(func, args)?,
            Expr::Conversion { ty, operand } => {
                let value = self.constant(operand)?.value;
                Constant {
                    value,
                    ty: self.resolve_type(ty)?,
                }
            }
            Expr::Composite(ty) => Constant {
                value: Value::Unknown,
                ty: self.resolve_type(ty)?,
            },
            Expr::FuncLit(func) => Constant {
                value: Value::Unknown,
                ty: self.signature(func)?,
            },
            Expr::Other(_) => self.unknown(),
        })
    }

    fn named_value(&mut self, ident: &Ident) -> Result<Constant> {
        let name = ident.name.as_str();
        if self.consts.contains_key(name) {
            return self.resolve_const(name);
        }
        let ty = if self.vars.contains_key(name) {
            self.resolve_var(name)?
        } else if self.funcs.contains_key(name) {
            self.resolve_func(name)?
        } else {
            return Ok(match name {
                "true" => self.untyped(Value::Bool(true), BasicKind::UntypedBool),
                "false" => self.untyped(Value::Bool(false), BasicKind::UntypedBool),
                "nil" => self.untyped(Value::Unknown, BasicKind::UntypedNil),
                _ => self.unknown(),
            });
        };
        Ok(Constant {
            value: Value::Unknown,
            ty,
        })
    }

    /// Conversions spelled as calls (`T(x)`), `len` of constant strings, and
    /// single-result package functions.
    fn call(&mut self, func: &'a Expr, args: &'a [Expr]) -> Result<Constant> {
        let Expr::Name(ident) = func else {
            return Ok(self.unknown());
        };
        let name = ident.name.as_str();

        if let Some(ty) = self.type_name(name) {
            let ty = ty?;
            let value = match args.first() {
                Some(arg) => self.constant(arg)?.value,
                None => Value::Unknown,
            };
            return Ok(Constant { value, ty });
        }

        if self.funcs.contains_key(name) {
            let sig = self.resolve_func(name)?;
            let results = match self.graph.get(sig) {
                TypeKind::Signature { results, .. } => *results,
                _ => return Ok(self.unknown()),
            };
            return Ok(match self.graph.get(results) {
                TypeKind::Tuple(vars) if vars.len() == 1 => Constant {
                    value: Value::Unknown,
                    ty: vars[0].ty,
                },
                _ => self.unknown(),
            });
        }

        if name == "len" {
            if let [arg] = args {
                if let Value::Str(s) = self.constant(arg)?.value {
                    let ty = self.basic(BasicKind::Int);
                    return Ok(Constant {
                        value: Value::Int(s.len() as i128),
                        ty,
                    });
                }
            }
        }
        Ok(self.unknown())
    }

    /// Result type of an arithmetic operation: a typed operand wins,
    /// otherwise the larger untyped kind.
    fn binary_type(&mut self, left: TypeId, right: TypeId) -> TypeId {
        match (self.untyped_kind(left), self.untyped_kind(right)) {
            (None, _) => left,
            (Some(_), None) => right,
            (Some(l), Some(r)) => {
                if untyped_rank(l) >= untyped_rank(r) {
                    left
                } else {
                    right
                }
            }
        }
    }
}

fn symbol(ident: &Ident, kind: SymbolKind, ty: TypeId) -> Symbol {
    Symbol::new(ident.name.clone(), kind, ty, is_exported(&ident.name)).at(ident.position.clone())
}

/// Implicit field name of an embedded field: the type name without package
/// qualifier or type arguments.
fn embedded_name(ty: &TypeExpr) -> &str {
    match ty {
        TypeExpr::Name(ident) => &ident.name,
        TypeExpr::Qualified { name, .. } => name,
        TypeExpr::Pointer(inner) => embedded_name(inner),
        TypeExpr::Generic(text) => {
            let base = text.split('[').next().unwrap_or(text);
            base.rsplit('.').next().unwrap_or(base)
        }
        _ => "",
    }
}

/// Ordering of untyped kinds when mixed in one expression.
fn untyped_rank(kind: BasicKind) -> Option<u8> {
    match kind {
        BasicKind::UntypedNil => Some(0),
        BasicKind::UntypedBool => Some(1),
        BasicKind::UntypedString => Some(2),
        BasicKind::UntypedInt => Some(3),
        BasicKind::UntypedRune => Some(4),
        BasicKind::UntypedFloat => Some(5),
        BasicKind::UntypedComplex => Some(6),
        _ => None,
    }
}

fn parse_int(text: &str) -> Option<i128> {
    let digits = text.replace('_', "");
    let lower = digits.to_ascii_lowercase();
    let (radix, body) = if let Some(rest) = lower.strip_prefix("0x") {
        (16, rest)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (2, rest)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (8, rest)
    } else if lower.len() > 1 && lower.starts_with('0') {
        (8, &lower[1..])
    } else {
        (10, lower.as_str())
    };
    i128::from_str_radix(body, radix).ok()
}

fn rune_value(literal: &str) -> Option<i128> {
    let inner = literal.strip_prefix('\'')?.strip_suffix('\'')?;
    let Some(escape) = inner.strip_prefix('\\') else {
        let mut chars = inner.chars();
        let c = chars.next()?;
        return chars.next().is_none().then_some(c as i128);
    };
    let simple = |c: char| c as i128;
    match escape.chars().next()? {
        'a' => Some(7),
        'b' => Some(8),
        'f' => Some(12),
        'n' => Some(simple('\n')),
        'r' => Some(simple('\r')),
        't' => Some(simple('\t')),
        'v' => Some(11),
        '\\' => Some(simple('\\')),
        '\'' => Some(simple('\'')),
        '"' => Some(simple('"')),
        'x' | 'u' | 'U' => i128::from_str_radix(&escape[1..], 16).ok(),
        '0'..='7' => i128::from_str_radix(escape, 8).ok(),
        _ => None,
    }
}

fn unary(op: &str, value: Value) -> Value {
    match (op, value) {
        ("+", v) => v,
        ("-", Value::Int(n)) => n.checked_neg().map_or(Value::Unknown, Value::Int),
        ("-", Value::Float(f)) => Value::Float(-f),
        ("^", Value::Int(n)) => Value::Int(!n),
        ("!", Value::Bool(b)) => Value::Bool(!b),
        _ => Value::Unknown,
    }
}

fn binary(op: &str, left: Value, right: Value) -> Value {
    use Value::*;
    match (left, right) {
        (Int(a), Int(b)) => match op {
            "+" => a.checked_add(b).map_or(Unknown, Int),
            "-" => a.checked_sub(b).map_or(Unknown, Int),
            "*" => a.checked_mul(b).map_or(Unknown, Int),
            "/" => a.checked_div(b).map_or(Unknown, Int),
            "%" => a.checked_rem(b).map_or(Unknown, Int),
            "&" => Int(a & b),
            "|" => Int(a | b),
            "^" => Int(a ^ b),
            "&^" => Int(a & !b),
            "<<" => shift_left(a, b).map_or(Unknown, Int),
            ">>" => u32::try_from(b).map_or(Unknown, |s| Int(a >> s.min(127))),
            "==" => Bool(a == b),
            "!=" => Bool(a != b),
            "<" => Bool(a < b),
            "<=" => Bool(a <= b),
            ">" => Bool(a > b),
            ">=" => Bool(a >= b),
            _ => Unknown,
        },
        (Float(a), Float(b)) => float_op(op, a, b),
        (Int(a), Float(b)) => float_op(op, a as f64, b),
        (Float(a), Int(b)) => float_op(op, a, b as f64),
        (Str(a), Str(b)) => match op {
            "+" => Str(a + &b),
            "==" => Bool(a == b),
            "!=" => Bool(a != b),
            _ => Unknown,
        },
        (Bool(a), Bool(b)) => match op {
            "&&" => Bool(a && b),
            "||" => Bool(a || b),
            "==" => Bool(a == b),
            "!=" => Bool(a != b),
            _ => Unknown,
        },
        _ => Unknown,
    }
}

/// `a << b`, or `None` when bits would be lost.
fn shift_left(a: i128, b: i128) -> Option<i128> {
    let s = u32::try_from(b).ok()?;
    let v = a.checked_shl(s)?;
    (v >> s == a).then_some(v)
}

fn float_op(op: &str, a: f64, b: f64) -> Value {
    match op {
        "+" => Value::Float(a + b),
        "-" => Value::Float(a - b),
        "*" => Value::Float(a * b),
        "/" if b != 0.0 => Value::Float(a / b),
        _ => Value::Unknown,
    }
}
