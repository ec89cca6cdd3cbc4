//! Structural type identity.
//!
//! Two descriptors are identical when their structure matches recursively.
//! Named types are transparent: they are unwrapped to their underlying type
//! on either side, so names never decide identity.
//!
//! Recursion through cyclic declarations is cut with stacks of pairs that are
//! currently under comparison. Revisiting a pair means the comparison closed
//! a cycle without finding a difference, so the pair is assumed identical; a
//! differing pair fails deeper in the recursion before the cycle closes.
//! The stacks are as deep as the nesting of recursive declarations, which is
//! tiny in practice, so a linear scan beats a hashed visited set.
//!
//! Structs are the exception to strict equality: when the field lists differ,
//! the struct compatibility rule decides, wherever the struct occurs. The
//! relation is therefore directional for structs, with `x` as the old side.

use crate::types::{TypeKind, TypeRef};

use super::structs::compatible_with;

/// A node in a stack of type pairs being compared.
struct Visited<'s, 'g> {
    x: TypeRef<'g>,
    y: TypeRef<'g>,
    prev: Option<&'s Visited<'s, 'g>>,
}

/// Whether the pair (x, y), in either order, is on the stack.
fn on_stack<'g>(mut stack: Option<&Visited<'_, 'g>>, x: TypeRef<'g>, y: TypeRef<'g>) -> bool {
    while let Some(node) = stack {
        if (node.x == x && node.y == y) || (node.x == y && node.y == x) {
            return true;
        }
        stack = node.prev;
    }
    false
}

/// Independent pair stacks, one per recursive case.
#[derive(Clone, Copy, Default)]
struct Seen<'s, 'g> {
    interfaces: Option<&'s Visited<'s, 'g>>,
    structs: Option<&'s Visited<'s, 'g>>,
    /// Guards cycles closing through named types whose underlying type is
    /// neither a struct nor an interface, e.g. `type F func() F`.
    named: Option<&'s Visited<'s, 'g>>,
}

/// Reports whether `x` and `y` denote the same type.
pub fn identical(x: TypeRef<'_>, y: TypeRef<'_>) -> bool {
    ident(x, y, Seen::default())
}

fn ident<'g>(x: TypeRef<'g>, y: TypeRef<'g>, seen: Seen<'_, 'g>) -> bool {
    if x == y {
        return true;
    }

    let x_named = matches!(x.kind(), TypeKind::Named { .. });
    let y_named = matches!(y.kind(), TypeKind::Named { .. });
    if x_named || y_named {
        if on_stack(seen.named, x, y) {
            return true;
        }
        let node = Visited {
            x,
            y,
            prev: seen.named,
        };
        let inner = Seen {
            named: Some(&node),
            ..seen
        };
        return ident(x.underlying(), y.underlying(), inner);
    }

    match x.kind() {
        TypeKind::Basic { kind: xk, .. } => {
            // byte/uint8 and rune/int32 are distinct nodes of the same kind.
            matches!(y.kind(), TypeKind::Basic { kind: yk, .. } if xk == yk)
        }

        TypeKind::Array { elem: xe, len: xl } => {
            let TypeKind::Array { elem: ye, len: yl } = y.kind() else {
                return false;
            };
            xl == yl && ident(x.at(*xe), y.at(*ye), seen)
        }

        TypeKind::Slice { elem: xe } => {
            let TypeKind::Slice { elem: ye } = y.kind() else {
                return false;
            };
            ident(x.at(*xe), y.at(*ye), seen)
        }

        TypeKind::Pointer { elem: xe } => {
            let TypeKind::Pointer { elem: ye } = y.kind() else {
                return false;
            };
            ident(x.at(*xe), y.at(*ye), seen)
        }

        TypeKind::Tuple(xs) => {
            let TypeKind::Tuple(ys) = y.kind() else {
                return false;
            };
            xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys)
                    .all(|(v, w)| ident(x.at(v.ty), y.at(w.ty), seen))
        }

        TypeKind::Signature {
            params: xp,
            results: xr,
            variadic: xv,
        } => {
            let TypeKind::Signature {
                params: yp,
                results: yr,
                variadic: yv,
            } = y.kind()
            else {
                return false;
            };
            // Parameter and result names are irrelevant.
            xv == yv && ident(x.at(*xp), y.at(*yp), seen) && ident(x.at(*xr), y.at(*yr), seen)
        }

        TypeKind::Struct { fields: xf } => {
            let TypeKind::Struct { fields: yf } = y.kind() else {
                return false;
            };
            if on_stack(seen.structs, x, y) {
                return true;
            }
            let node = Visited {
                x,
                y,
                prev: seen.structs,
            };
            let inner = Seen {
                structs: Some(&node),
                ..seen
            };
            let same_shape = xf.len() == yf.len()
                && xf.iter().zip(yf).all(|(f, g)| {
                    f.embedded == g.embedded
                        && f.tag == g.tag
                        && f.name == g.name
                        && ident(x.at(f.ty), y.at(g.ty), inner)
                });
            // A struct reached through any other type may still have evolved
            // compatibly; `x` is the old side.
            same_shape || compatible_with(x, y, |a, b| ident(a, b, inner))
        }

        TypeKind::Interface { .. } => {
            if !matches!(y.kind(), TypeKind::Interface { .. }) {
                return false;
            }
            let xm = x.graph.method_set(x.id);
            let ym = y.graph.method_set(y.id);
            if xm.len() != ym.len() {
                return false;
            }
            // An interface may mention itself through an anonymous interface
            // embedding it: `type T interface { m() interface{ T } }`.
            if on_stack(seen.interfaces, x, y) {
                return true;
            }
            let node = Visited {
                x,
                y,
                prev: seen.interfaces,
            };
            let inner = Seen {
                interfaces: Some(&node),
                ..seen
            };
            // Method sets are sorted by name, so order in source is irrelevant.
            xm.iter()
                .zip(&ym)
                .all(|(f, g)| f.name == g.name && ident(x.at(f.sig), y.at(g.sig), inner))
        }

        TypeKind::Map {
            key: xk,
            value: xv,
        } => {
            let TypeKind::Map {
                key: yk,
                value: yv,
            } = y.kind()
            else {
                return false;
            };
            ident(x.at(*xk), y.at(*yk), seen) && ident(x.at(*xv), y.at(*yv), seen)
        }

        TypeKind::Chan { dir: xd, elem: xe } => {
            let TypeKind::Chan { dir: yd, elem: ye } = y.kind() else {
                return false;
            };
            xd == yd && ident(x.at(*xe), y.at(*ye), seen)
        }

        TypeKind::Opaque { path: xp } => {
            matches!(y.kind(), TypeKind::Opaque { path: yp } if xp == yp)
        }

        TypeKind::Named { .. } => unreachable!("named types are unwrapped above"),
    }
}
