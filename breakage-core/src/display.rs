//! Go-style rendering of type descriptors.
//!
//! Named types print by name, so rendering terminates on cyclic graphs:
//! every cycle in a well-formed graph passes through a named type or an
//! embedded interface, and embedded types are printed by reference too.

use std::fmt::{self, Write};

use crate::types::{ChanDir, TypeGraph, TypeId, TypeKind};

impl TypeGraph {
    /// Render a type expression, e.g. `func(int, ...string) (bool, error)`.
    pub fn display(&self, id: TypeId) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_type(&mut out, id);
        out
    }

    /// Render the definition behind a type: a named type shows its
    /// underlying structure one level deep (`struct{Next *Node}`).
    pub fn display_definition(&self, id: TypeId) -> String {
        match self.get(id) {
            TypeKind::Named {
                underlying: Some(underlying),
                ..
            } => self.display(*underlying),
            _ => self.display(id),
        }
    }

    fn write_type(&self, out: &mut String, id: TypeId) -> fmt::Result {
        match self.get(id) {
            TypeKind::Basic { name, .. } => out.write_str(name),
            TypeKind::Array { elem, len } => {
                write!(out, "[{}]", len)?;
                self.write_type(out, *elem)
            }
            TypeKind::Slice { elem } => {
                out.write_str("[]")?;
                self.write_type(out, *elem)
            }
            TypeKind::Pointer { elem } => {
                out.write_char('*')?;
                self.write_type(out, *elem)
            }
            TypeKind::Tuple(vars) => {
                out.write_char('(')?;
                for (i, var) in vars.iter().enumerate() {
                    if i > 0 {
                        out.write_str(", ")?;
                    }
                    self.write_type(out, var.ty)?;
                }
                out.write_char(')')
            }
            TypeKind::Signature { .. } => {
                out.write_str("func")?;
                self.write_signature(out, id)
            }
            TypeKind::Interface { methods, embedded } => {
                out.write_str("interface{")?;
                let mut first = true;
                for &inner in embedded {
                    if !first {
                        out.write_str("; ")?;
                    }
                    first = false;
                    self.write_type(out, inner)?;
                }
                for method in methods {
                    if !first {
                        out.write_str("; ")?;
                    }
                    first = false;
                    out.write_str(&method.name)?;
                    self.write_signature(out, method.sig)?;
                }
                out.write_char('}')
            }
            TypeKind::Map { key, value } => {
                out.write_str("map[")?;
                self.write_type(out, *key)?;
                out.write_char(']')?;
                self.write_type(out, *value)
            }
            TypeKind::Chan { dir, elem } => {
                out.write_str(match dir {
                    ChanDir::Both => "chan ",
                    ChanDir::Send => "chan<- ",
                    ChanDir::Recv => "<-chan ",
                })?;
                self.write_type(out, *elem)
            }
            TypeKind::Named { name, .. } => out.write_str(name),
            TypeKind::Struct { fields } => {
                out.write_str("struct{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        out.write_str("; ")?;
                    }
                    if !field.embedded {
                        out.write_str(&field.name)?;
                        out.write_char(' ')?;
                    }
                    self.write_type(out, field.ty)?;
                    if !field.tag.is_empty() {
                        write!(out, " {:?}", field.tag)?;
                    }
                }
                out.write_char('}')
            }
            TypeKind::Opaque { path } => out.write_str(path),
        }
    }

    /// Parameters and results of a signature node, without the `func`
    /// keyword.
    fn write_signature(&self, out: &mut String, sig: TypeId) -> fmt::Result {
        let TypeKind::Signature {
            params,
            results,
            variadic,
        } = self.get(sig)
        else {
            return self.write_type(out, sig);
        };

        let params = self.tuple_types(*params);
        out.write_char('(')?;
        for (i, &param) in params.iter().enumerate() {
            if i > 0 {
                out.write_str(", ")?;
            }
            let last = i + 1 == params.len();
            match self.get(param) {
                TypeKind::Slice { elem } if *variadic && last => {
                    out.write_str("...")?;
                    self.write_type(out, *elem)?;
                }
                _ => self.write_type(out, param)?,
            }
        }
        out.write_char(')')?;

        let results = self.tuple_types(*results);
        match results.as_slice() {
            [] => Ok(()),
            [single] => {
                out.write_char(' ')?;
                self.write_type(out, *single)
            }
            many => {
                out.write_str(" (")?;
                for (i, &result) in many.iter().enumerate() {
                    if i > 0 {
                        out.write_str(", ")?;
                    }
                    self.write_type(out, result)?;
                }
                out.write_char(')')
            }
        }
    }

    fn tuple_types(&self, tuple: TypeId) -> Vec<TypeId> {
        match self.get(tuple) {
            TypeKind::Tuple(vars) => vars.iter().map(|v| v.ty).collect(),
            _ => vec![tuple],
        }
    }
}
