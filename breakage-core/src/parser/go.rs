//! Go declaration extractor using tree-sitter.
//!
//! Lowers the package-level declarations of one file into [`super::ast`]
//! structures. Method declarations and function bodies are skipped; only
//! what can appear in a package's exported surface is kept.

use tree_sitter::{Node, Parser};

use super::ast::{
    Decl, Expr, FieldDecl, File, FuncDecl, FuncType, Ident, Import, InterfaceElem, Param,
    TypeExpr, TypeSpec, ValueSpec,
};
use super::helpers::{
    children_by_field, find_child_by_type, first_error, get_node_text, has_token, named_children,
    position_of, unquote,
};
use crate::error::{Error, Result};
use crate::types::ChanDir;

/// Parse Go source code.
pub fn parse(source: &str, file_path: &str) -> Result<File> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_go::LANGUAGE.into())
        .map_err(|e| Error::Parser {
            message: format!("Failed to set Go language: {}", e),
        })?;

    let tree = parser.parse(source, None).ok_or_else(|| Error::Parser {
        message: format!("Failed to parse {}", file_path),
    })?;
    let root = tree.root_node();

    if let Some(bad) = first_error(&root) {
        return Err(Error::Syntax {
            position: position_of(&bad, file_path),
        });
    }

    let cx = Extractor {
        source,
        path: file_path,
    };
    let mut file = File {
        path: file_path.to_string(),
        ..Default::default()
    };

    for child in named_children(&root) {
        match child.kind() {
            "package_clause" => {
                if let Some(id) = find_child_by_type(&child, "package_identifier") {
                    file.package = cx.text(&id).to_string();
                }
            }
            "import_declaration" => cx.imports(&child, &mut file.imports),
            "function_declaration" => file.decls.push(Decl::Func(cx.function(&child)?)),
            // Methods belong to their receiver's method set, not to package scope.
            "method_declaration" => {}
            "type_declaration" => cx.type_declaration(&child, &mut file.decls)?,
            "const_declaration" => cx.const_declaration(&child, &mut file.decls)?,
            "var_declaration" => cx.var_declaration(&child, &mut file.decls)?,
            _ => {}
        }
    }

    if file.package.is_empty() {
        return Err(Error::Syntax {
            position: position_of(&root, file_path),
        });
    }

    tracing::debug!(
        path = file_path,
        package = %file.package,
        decls = file.decls.len(),
        "parsed file"
    );
    Ok(file)
}

struct Extractor<'s> {
    source: &'s str,
    path: &'s str,
}

impl<'s> Extractor<'s> {
    fn text(&self, node: &Node) -> &'s str {
        get_node_text(node, self.source)
    }

    fn ident(&self, node: &Node) -> Ident {
        Ident {
            name: self.text(node).to_string(),
            position: position_of(node, self.path),
        }
    }

    /// A required field; its absence means the tree is not what we expect.
    fn field<'t>(&self, node: &Node<'t>, name: &str) -> Result<Node<'t>> {
        node.child_by_field_name(name).ok_or_else(|| Error::Syntax {
            position: position_of(node, self.path),
        })
    }

    fn unexpected(&self, node: &Node) -> Error {
        tracing::debug!(kind = node.kind(), text = self.text(node), "unexpected node");
        Error::Syntax {
            position: position_of(node, self.path),
        }
    }

    /// Named identifiers under a (possibly repeated) field.
    fn names(&self, node: &Node, field: &str) -> Vec<Ident> {
        children_by_field(node, field)
            .iter()
            .filter(|n| n.is_named())
            .map(|n| self.ident(n))
            .collect()
    }

    fn imports(&self, node: &Node, imports: &mut Vec<Import>) {
        for spec in collect_specs(node, "import_spec") {
            let Some(path) = spec.child_by_field_name("path") else {
                continue;
            };
            let path = unquote(self.text(&path));
            if path.is_empty() {
                continue;
            }
            let name = spec
                .child_by_field_name("name")
                .map(|n| self.text(&n).to_string());
            imports.push(Import { name, path });
        }
    }

    fn function(&self, node: &Node) -> Result<FuncDecl> {
        Ok(FuncDecl {
            name: self.ident(&self.field(node, "name")?),
            type_params: self.type_params(node),
            sig: self.func_type(node)?,
        })
    }

    fn type_params(&self, node: &Node) -> Vec<String> {
        let Some(list) = node.child_by_field_name("type_parameters") else {
            return Vec::new();
        };
        named_children(&list)
            .iter()
            .flat_map(|decl| self.names(decl, "name"))
            .map(|id| id.name)
            .collect()
    }

    fn type_declaration(&self, node: &Node, decls: &mut Vec<Decl>) -> Result<()> {
        for spec in named_children(node) {
            let alias = match spec.kind() {
                "type_spec" => false,
                "type_alias" => true,
                _ => continue,
            };
            decls.push(Decl::Type(TypeSpec {
                name: self.ident(&self.field(&spec, "name")?),
                alias,
                type_params: self.type_params(&spec),
                ty: self.type_expr(&self.field(&spec, "type")?)?,
            }));
        }
        Ok(())
    }

    fn const_declaration(&self, node: &Node, decls: &mut Vec<Decl>) -> Result<()> {
        // A spec without values repeats the type and values of the previous
        // one, re-evaluated with its own iota.
        let mut previous: (Option<TypeExpr>, Vec<Expr>) = (None, Vec::new());
        for (iota, spec) in collect_specs(node, "const_spec").iter().enumerate() {
            let (ty, values) = self.value_parts(spec)?;
            let (ty, values) = if values.is_empty() {
                previous.clone()
            } else {
                previous = (ty.clone(), values.clone());
                (ty, values)
            };
            decls.push(Decl::Const(ValueSpec {
                names: self.names(spec, "name"),
                ty,
                values,
                iota: iota as u64,
            }));
        }
        Ok(())
    }

    fn var_declaration(&self, node: &Node, decls: &mut Vec<Decl>) -> Result<()> {
        for spec in collect_specs(node, "var_spec") {
            let (ty, values) = self.value_parts(&spec)?;
            decls.push(Decl::Var(ValueSpec {
                names: self.names(&spec, "name"),
                ty,
                values,
                iota: 0,
            }));
        }
        Ok(())
    }

    fn value_parts(&self, spec: &Node) -> Result<(Option<TypeExpr>, Vec<Expr>)> {
        let ty = spec
            .child_by_field_name("type")
            .map(|t| self.type_expr(&t))
            .transpose()?;
        let values = match spec.child_by_field_name("value") {
            Some(list) => named_children(&list)
                .iter()
                .map(|e| self.expr(e))
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };
        Ok((ty, values))
    }

    fn type_expr(&self, node: &Node) -> Result<TypeExpr> {
        Ok(match node.kind() {
            "type_identifier" | "identifier" => TypeExpr::Name(self.ident(node)),
            "qualified_type" => TypeExpr::Qualified {
                package: self.text(&self.field(node, "package")?).to_string(),
                name: self.text(&self.field(node, "name")?).to_string(),
                position: position_of(node, self.path),
            },
            "pointer_type" => {
                let inner = named_children(node)
                    .into_iter()
                    .next()
                    .ok_or_else(|| self.unexpected(node))?;
                TypeExpr::Pointer(Box::new(self.type_expr(&inner)?))
            }
            "slice_type" => {
                TypeExpr::Slice(Box::new(self.type_expr(&self.field(node, "element")?)?))
            }
            "array_type" => {
                let len = self.field(node, "length")?;
                TypeExpr::Array {
                    len: Box::new(self.expr(&len)?),
                    len_text: self.text(&len).to_string(),
                    position: position_of(&len, self.path),
                    elem: Box::new(self.type_expr(&self.field(node, "element")?)?),
                }
            }
            "map_type" => TypeExpr::Map {
                key: Box::new(self.type_expr(&self.field(node, "key")?)?),
                value: Box::new(self.type_expr(&self.field(node, "value")?)?),
            },
            "channel_type" => TypeExpr::Chan {
                dir: chan_dir(node),
                elem: Box::new(self.type_expr(&self.field(node, "value")?)?),
            },
            "function_type" => TypeExpr::Func(self.func_type(node)?),
            "struct_type" => TypeExpr::Struct(self.struct_fields(node)?),
            "interface_type" => TypeExpr::Interface(self.interface_elems(node)?),
            "parenthesized_type" => {
                let inner = named_children(node)
                    .into_iter()
                    .next()
                    .ok_or_else(|| self.unexpected(node))?;
                self.type_expr(&inner)?
            }
            "generic_type" => TypeExpr::Generic(
                self.text(node)
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect(),
            ),
            _ => return Err(self.unexpected(node)),
        })
    }

    /// Parameters and results of a function declaration, function type,
    /// function literal or interface method.
    fn func_type(&self, node: &Node) -> Result<FuncType> {
        let (params, variadic) = self.parameters(&self.field(node, "parameters")?)?;
        let results = match node.child_by_field_name("result") {
            None => Vec::new(),
            Some(list) if list.kind() == "parameter_list" => self.parameters(&list)?.0,
            Some(single) => vec![Param {
                name: String::new(),
                ty: self.type_expr(&single)?,
            }],
        };
        Ok(FuncType {
            params,
            results,
            variadic,
        })
    }

    fn parameters(&self, list: &Node) -> Result<(Vec<Param>, bool)> {
        let mut params = Vec::new();
        let mut variadic = false;
        for decl in named_children(list) {
            match decl.kind() {
                "parameter_declaration" | "variadic_parameter_declaration" => {
                    variadic = decl.kind() == "variadic_parameter_declaration";
                    let ty = self.type_expr(&self.field(&decl, "type")?)?;
                    let names = self.names(&decl, "name");
                    if names.is_empty() {
                        params.push(Param {
                            name: String::new(),
                            ty,
                        });
                    } else {
                        params.extend(names.into_iter().map(|n| Param {
                            name: n.name,
                            ty: ty.clone(),
                        }));
                    }
                }
                _ => return Err(self.unexpected(&decl)),
            }
        }
        Ok((params, variadic))
    }

    fn struct_fields(&self, node: &Node) -> Result<Vec<FieldDecl>> {
        let Some(list) = find_child_by_type(node, "field_declaration_list") else {
            return Ok(Vec::new());
        };
        named_children(&list)
            .iter()
            .filter(|decl| decl.kind() == "field_declaration")
            .map(|decl| {
                let names: Vec<String> = self
                    .names(decl, "name")
                    .into_iter()
                    .map(|id| id.name)
                    .collect();
                let pointer = names.is_empty() && has_token(decl, "*");
                let tag = decl
                    .child_by_field_name("tag")
                    .map(|t| unquote(self.text(&t)))
                    .unwrap_or_default();
                Ok(FieldDecl {
                    names,
                    ty: self.type_expr(&self.field(decl, "type")?)?,
                    pointer,
                    tag,
                })
            })
            .collect()
    }

    fn interface_elems(&self, node: &Node) -> Result<Vec<InterfaceElem>> {
        let mut elems = Vec::new();
        for elem in named_children(node) {
            match elem.kind() {
                "method_elem" | "method_spec" => elems.push(InterfaceElem::Method {
                    name: self.text(&self.field(&elem, "name")?).to_string(),
                    sig: self.func_type(&elem)?,
                }),
                "type_elem" | "constraint_elem" => {
                    let terms = named_children(&elem);
                    match terms.as_slice() {
                        [single] if is_embeddable(single) => {
                            elems.push(InterfaceElem::Embed(self.type_expr(single)?))
                        }
                        _ => elems.push(InterfaceElem::Constraint(self.text(&elem).to_string())),
                    }
                }
                "type_identifier" | "qualified_type" | "generic_type" => {
                    elems.push(InterfaceElem::Embed(self.type_expr(&elem)?))
                }
                _ => {}
            }
        }
        Ok(elems)
    }

    fn expr(&self, node: &Node) -> Result<Expr> {
        let text = self.text(node);
        Ok(match node.kind() {
            "int_literal" => Expr::Int(text.to_string()),
            "float_literal" => Expr::Float(text.to_string()),
            "imaginary_literal" => Expr::Imaginary(text.to_string()),
            "rune_literal" => Expr::Rune(text.to_string()),
            "interpreted_string_literal" | "raw_string_literal" => Expr::Str(unquote(text)),
            "true" => Expr::Bool(true),
            "false" => Expr::Bool(false),
            "nil" => Expr::Nil,
            "iota" => Expr::Iota,
            "identifier" if text == "iota" => Expr::Iota,
            "identifier" => Expr::Name(self.ident(node)),
            "selector_expression" => {
                let operand = self.field(node, "operand")?;
                let field = self.field(node, "field")?;
                if operand.kind() == "identifier" {
                    Expr::Selector {
                        package: self.text(&operand).to_string(),
                        name: self.text(&field).to_string(),
                    }
                } else {
                    Expr::Other(text.to_string())
                }
            }
            "parenthesized_expression" => match named_children(node).first() {
                Some(inner) => self.expr(inner)?,
                None => Expr::Other(text.to_string()),
            },
            "unary_expression" => Expr::Unary {
                op: self.text(&self.field(node, "operator")?).to_string(),
                operand: Box::new(self.expr(&self.field(node, "operand")?)?),
            },
            "binary_expression" => Expr::Binary {
                op: self.text(&self.field(node, "operator")?).to_string(),
                left: Box::new(self.expr(&self.field(node, "left")?)?),
                right: Box::new(self.expr(&self.field(node, "right")?)?),
            },
            "call_expression" => {
                let func = self.field(node, "function")?;
                let args = match node.child_by_field_name("arguments") {
                    Some(list) => named_children(&list)
                        .iter()
                        .map(|a| self.expr(a))
                        .collect::<Result<Vec<_>>>()?,
                    None => Vec::new(),
                };
                if is_type_node(&func) {
                    match args.into_iter().next() {
                        Some(operand) => Expr::Conversion {
                            ty: self.type_expr(&func)?,
                            operand: Box::new(operand),
                        },
                        None => Expr::Other(text.to_string()),
                    }
                } else {
                    Expr::Call {
                        func: Box::new(self.expr(&func)?),
                        args,
                    }
                }
            }
            "type_conversion_expression" => Expr::Conversion {
                ty: self.type_expr(&self.field(node, "type")?)?,
                operand: Box::new(self.expr(&self.field(node, "operand")?)?),
            },
            "composite_literal" => {
                let ty = self.field(node, "type")?;
                if ty.kind() == "implicit_length_array_type" {
                    Expr::Other(text.to_string())
                } else {
                    Expr::Composite(self.type_expr(&ty)?)
                }
            }
            "func_literal" => Expr::FuncLit(self.func_type(node)?),
            _ => Expr::Other(text.to_string()),
        })
    }
}

/// Spec nodes of a declaration, whether grouped in parentheses or not.
fn collect_specs<'t>(node: &Node<'t>, kind: &str) -> Vec<Node<'t>> {
    let mut specs = Vec::new();
    for child in named_children(node) {
        if child.kind() == kind {
            specs.push(child);
        } else {
            specs.extend(collect_specs(&child, kind));
        }
    }
    specs
}

fn chan_dir(node: &Node) -> ChanDir {
    let mut cursor = node.walk();
    let tokens: Vec<&str> = node
        .children(&mut cursor)
        .filter(|c| !c.is_named())
        .map(|c| c.kind())
        .take(2)
        .collect();
    match tokens.as_slice() {
        ["<-", ..] => ChanDir::Recv,
        ["chan", "<-"] => ChanDir::Send,
        _ => ChanDir::Both,
    }
}

/// Type syntax that can be the callee of a conversion.
fn is_type_node(node: &Node) -> bool {
    matches!(
        node.kind(),
        "slice_type"
            | "array_type"
            | "map_type"
            | "pointer_type"
            | "channel_type"
            | "function_type"
            | "struct_type"
            | "interface_type"
            | "parenthesized_type"
            | "qualified_type"
            | "generic_type"
    )
}

fn is_embeddable(node: &Node) -> bool {
    matches!(
        node.kind(),
        "type_identifier" | "qualified_type" | "generic_type"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> File {
        parse(source, "test.go").unwrap()
    }

    #[test]
    fn test_parse_package_and_imports() {
        let file = parse_ok(
            r#"package demo

import (
    "fmt"
    str "strings"
    "net/http"
)
"#,
        );
        assert_eq!(file.package, "demo");
        assert_eq!(file.imports.len(), 3);
        assert_eq!(file.imports[0].local_name(), "fmt");
        assert_eq!(file.imports[1].local_name(), "str");
        assert_eq!(file.imports[2].local_name(), "http");
        assert_eq!(file.imports[2].path, "net/http");
    }

    #[test]
    fn test_parse_function() {
        let file = parse_ok(
            r#"package demo

func Join(sep string, parts ...string) (string, error) {
    return "", nil
}

func (r *Reader) Method() {}
"#,
        );
        assert_eq!(file.decls.len(), 1);
        let Decl::Func(f) = &file.decls[0] else {
            panic!("expected func");
        };
        assert_eq!(f.name.name, "Join");
        assert_eq!(f.name.position.line, 3);
        assert_eq!(f.sig.params.len(), 2);
        assert_eq!(f.sig.params[1].name, "parts");
        assert!(f.sig.variadic);
        assert_eq!(f.sig.results.len(), 2);
    }

    #[test]
    fn test_parse_grouped_params() {
        let file = parse_ok("package demo\nfunc F(a, b int, c string) int { return 0 }\n");
        let Decl::Func(f) = &file.decls[0] else {
            panic!("expected func");
        };
        let names: Vec<_> = f.sig.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(!f.sig.variadic);
        assert_eq!(f.sig.results.len(), 1);
    }

    #[test]
    fn test_parse_struct() {
        let file = parse_ok(
            r#"package demo

type Config struct {
    Name, Alias string `json:"name"`
    *Base
    io.Reader
    count int
}
"#,
        );
        let Decl::Type(spec) = &file.decls[0] else {
            panic!("expected type");
        };
        assert!(!spec.alias);
        let TypeExpr::Struct(fields) = &spec.ty else {
            panic!("expected struct");
        };
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0].names, vec!["Name", "Alias"]);
        assert_eq!(fields[0].tag, "json:\"name\"");
        assert!(fields[1].is_embedded());
        assert!(fields[1].pointer);
        assert!(fields[2].is_embedded());
        assert!(!fields[2].pointer);
        assert!(matches!(fields[2].ty, TypeExpr::Qualified { .. }));
        assert_eq!(fields[3].names, vec!["count"]);
    }

    #[test]
    fn test_parse_interface_and_alias() {
        let file = parse_ok(
            r#"package demo

type (
    Closer interface {
        Close() error
    }
    ReadCloser interface {
        Closer
        Read(p []byte) (n int, err error)
    }
    Number interface {
        ~int | ~float64
    }
    Handle = Closer
)
"#,
        );
        assert_eq!(file.decls.len(), 4);
        let Decl::Type(rc) = &file.decls[1] else {
            panic!("expected type");
        };
        let TypeExpr::Interface(elems) = &rc.ty else {
            panic!("expected interface");
        };
        assert!(matches!(&elems[0], InterfaceElem::Embed(TypeExpr::Name(id)) if id.name == "Closer"));
        assert!(matches!(&elems[1], InterfaceElem::Method { name, .. } if name == "Read"));

        let Decl::Type(number) = &file.decls[2] else {
            panic!("expected type");
        };
        let TypeExpr::Interface(elems) = &number.ty else {
            panic!("expected interface");
        };
        assert!(matches!(&elems[0], InterfaceElem::Constraint(_)));

        let Decl::Type(handle) = &file.decls[3] else {
            panic!("expected type");
        };
        assert!(handle.alias);
    }

    #[test]
    fn test_parse_const_group_repeats() {
        let file = parse_ok(
            r#"package demo

const (
    Sunday Weekday = iota
    Monday
    Tuesday
)
"#,
        );
        assert_eq!(file.decls.len(), 3);
        let Decl::Const(tuesday) = &file.decls[2] else {
            panic!("expected const");
        };
        assert_eq!(tuesday.names[0].name, "Tuesday");
        assert_eq!(tuesday.iota, 2);
        assert!(matches!(&tuesday.ty, Some(TypeExpr::Name(id)) if id.name == "Weekday"));
        assert!(matches!(tuesday.values[0], Expr::Iota));
    }

    #[test]
    fn test_parse_var_forms() {
        let file = parse_ok(
            r#"package demo

var (
    A, B int
    C = &Config{}
    D = []string{"x"}
)
var E = 1 << 3
"#,
        );
        assert_eq!(file.decls.len(), 4);
        let Decl::Var(ab) = &file.decls[0] else {
            panic!("expected var");
        };
        assert_eq!(ab.names.len(), 2);
        assert!(ab.values.is_empty());
        let Decl::Var(c) = &file.decls[1] else {
            panic!("expected var");
        };
        assert!(matches!(&c.values[0], Expr::Unary { op, operand } if op == "&" && matches!(**operand, Expr::Composite(_))));
        let Decl::Var(e) = &file.decls[3] else {
            panic!("expected var");
        };
        assert!(matches!(&e.values[0], Expr::Binary { op, .. } if op == "<<"));
    }

    #[test]
    fn test_parse_channels() {
        let file = parse_ok(
            r#"package demo

type Pipes struct {
    In  <-chan int
    Out chan<- int
    Both chan int
}
"#,
        );
        let Decl::Type(spec) = &file.decls[0] else {
            panic!("expected type");
        };
        let TypeExpr::Struct(fields) = &spec.ty else {
            panic!("expected struct");
        };
        let dirs: Vec<_> = fields
            .iter()
            .map(|f| match &f.ty {
                TypeExpr::Chan { dir, .. } => *dir,
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(dirs, vec![ChanDir::Recv, ChanDir::Send, ChanDir::Both]);
    }

    #[test]
    fn test_parse_generics() {
        let file = parse_ok(
            r#"package demo

type List[T any] struct {
    items []T
}

func Map[K comparable, V any](m map[K]V) List[ V ] { panic("unimplemented") }
"#,
        );
        let Decl::Type(list) = &file.decls[0] else {
            panic!("expected type");
        };
        assert_eq!(list.type_params, vec!["T"]);
        let Decl::Func(f) = &file.decls[1] else {
            panic!("expected func");
        };
        assert_eq!(f.type_params, vec!["K", "V"]);
        assert!(matches!(&f.sig.results[0].ty, TypeExpr::Generic(text) if text == "List[V]"));
    }

    #[test]
    fn test_syntax_error_position() {
        let err = parse("package demo\n\nfunc F( {\n", "bad.go").unwrap_err();
        match err {
            Error::Syntax { position } => {
                assert_eq!(position.file, "bad.go");
                assert!(position.line >= 1);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_missing_package_clause() {
        assert!(matches!(
            parse("", "empty.go"),
            Err(Error::Syntax { .. })
        ));
    }
}
