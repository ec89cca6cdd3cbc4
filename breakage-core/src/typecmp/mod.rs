//! Type comparison: structural identity and struct compatibility.

mod identical;
mod structs;

pub use identical::identical;
pub use structs::struct_compatible;
