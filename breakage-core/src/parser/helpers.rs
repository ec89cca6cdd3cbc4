//! Helper functions for tree-sitter AST navigation.

use tree_sitter::Node;

use crate::types::Position;

/// Get the text content of a node.
pub fn get_node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    let start = node.start_byte();
    let end = node.end_byte();
    if start < source.len() && end <= source.len() && start < end {
        &source[start..end]
    } else {
        ""
    }
}

/// Find the first child of a specific type.
pub fn find_child_by_type<'a>(node: &Node<'a>, type_name: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|c| c.kind() == type_name);
    found
}

/// Named children, without comments.
pub fn named_children<'a>(node: &Node<'a>) -> Vec<Node<'a>> {
    let mut cursor = node.walk();
    let children = node
        .named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .collect();
    children
}

/// All children carrying a field name.
pub fn children_by_field<'a>(node: &Node<'a>, field_name: &str) -> Vec<Node<'a>> {
    let mut cursor = node.walk();
    let children = node.children_by_field_name(field_name, &mut cursor).collect();
    children
}

/// Whether an anonymous token child with this text exists.
pub fn has_token(node: &Node, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|c| !c.is_named() && c.kind() == token);
    found
}

/// 1-indexed position of a node's start.
pub fn position_of(node: &Node, path: &str) -> Position {
    let point = node.start_position();
    Position::new(path, point.row as u32 + 1, point.column as u32 + 1)
}

/// First ERROR or MISSING node in a subtree, in source order.
pub fn first_error<'a>(node: &Node<'a>) -> Option<Node<'a>> {
    if node.is_error() || node.is_missing() {
        return Some(*node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children.iter().find_map(first_error)
}

/// Value of a Go string literal: backquoted text verbatim, double-quoted
/// text with the common escapes decoded.
pub fn unquote(literal: &str) -> String {
    if let Some(raw) = literal
        .strip_prefix('`')
        .and_then(|s| s.strip_suffix('`'))
    {
        return raw.replace('\r', "");
    }
    let inner = literal
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(literal);

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Go exports identifiers that start with an uppercase letter.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}
