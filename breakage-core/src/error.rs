//! Error types for breakage-core.
//!
//! The comparison engine itself is total and never fails; every error here
//! comes from building symbol tables (front end, source discovery) or from
//! malformed tables handed to the core.

use thiserror::Error;

use crate::types::Position;

/// Result type alias for breakage-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or assembling symbol tables.
#[derive(Error, Debug)]
pub enum Error {
    /// Two top-level symbols with the same name were inserted into one table.
    #[error("Duplicate symbol: {name}")]
    DuplicateSymbol {
        /// The name that was declared twice.
        name: String,
    },

    /// The source set contained no files to analyze.
    #[error("No Go source files found in {origin}")]
    NoSources {
        /// Human-readable description of where sources were looked up.
        origin: String,
    },

    /// Source files disagree about the package they belong to.
    #[error("Multiple packages found: {first} and {second}")]
    PackageMismatch {
        /// Package name of the first file.
        first: String,
        /// Conflicting package name.
        second: String,
    },

    /// The source could not be parsed.
    #[error("Syntax error at {position}")]
    Syntax {
        /// Location of the first erroneous node.
        position: Position,
    },

    /// A type name could not be resolved in package or universe scope.
    #[error("Undefined type {name} at {position}")]
    UndefinedType {
        /// The unresolved identifier.
        name: String,
        /// Where it was referenced.
        position: Position,
    },

    /// A named type is defined in terms of itself without indirection.
    #[error("Invalid recursive type {name}")]
    InvalidRecursiveType {
        /// The type whose definition loops.
        name: String,
    },

    /// A constant or variable initializer refers back to itself.
    #[error("Initialization cycle for {name}")]
    InitializationCycle {
        /// The declaration whose value depends on itself.
        name: String,
    },

    /// An array length is not a constant integer expression.
    #[error("Array length is not an integer constant at {position}: {expr}")]
    NonConstantLength {
        /// Source text of the length expression.
        expr: String,
        /// Location of the expression.
        position: Position,
    },

    /// An array length is a constant but negative or too large for `int`.
    #[error("Invalid array length {expr} at {position}")]
    InvalidArrayLength {
        /// Source text of the length expression.
        expr: String,
        /// Location of the expression.
        position: Position,
    },

    /// Tree-sitter grammar setup failed.
    #[error("Parser error: {message}")]
    Parser {
        /// Description of the parser error.
        message: String,
    },

    /// An allow-list pattern is not a valid regular expression.
    #[error("Invalid allow pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// IO error reading source files.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Directory walking error.
    #[error("Walk error: {0}")]
    WalkError(#[from] ignore::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::DuplicateSymbol {
            name: "Foo".to_string(),
        };
        assert!(err.to_string().contains("Foo"));

        let err = Error::UndefinedType {
            name: "Missing".to_string(),
            position: Position::new("a.go", 3, 9),
        };
        assert!(err.to_string().contains("Missing"));
        assert!(err.to_string().contains("a.go:3:9"));
    }
}
