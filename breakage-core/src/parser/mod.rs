//! Go front end.
//!
//! Builds a [`SymbolTable`] from Go source text. Files are parsed in
//! parallel with tree-sitter, then the package scope is resolved on one
//! thread in path order, so results do not depend on scheduling.

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::scope::SymbolTable;

pub mod ast;
pub mod go;
mod helpers;
mod resolve;

pub use helpers::is_exported;

/// One source file, already read into memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceFile {
    pub path: String,
    pub source: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
        }
    }
}

/// The files of one package snapshot, from a directory or from an
/// in-memory file map such as a VCS tree.
#[derive(Clone, Debug, Default)]
pub struct SourceSet {
    /// Where the files came from, for messages.
    pub origin: String,
    files: Vec<SourceFile>,
}

impl SourceSet {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            files: Vec::new(),
        }
    }

    /// Build a set from `(path, source)` pairs.
    pub fn from_files<I, P, S>(origin: impl Into<String>, files: I) -> Self
    where
        I: IntoIterator<Item = (P, S)>,
        P: Into<String>,
        S: Into<String>,
    {
        let mut set = Self::new(origin);
        for (path, source) in files {
            set.push(SourceFile::new(path, source));
        }
        set
    }

    /// Add a file, keeping the set sorted by path.
    pub fn push(&mut self, file: SourceFile) {
        let at = self.files.partition_point(|f| f.path < file.path);
        self.files.insert(at, file);
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Parse multiple files in parallel using rayon.
///
/// Results come back in input order. `num_threads` of `None` or zero uses
/// the global pool.
pub fn parse_files_parallel(
    files: &[SourceFile],
    num_threads: Option<usize>,
) -> Vec<Result<ast::File>> {
    let pool = match num_threads {
        Some(n) if n > 0 => rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build()
            .ok(),
        _ => None,
    };

    let parse_fn = |file: &SourceFile| go::parse(&file.source, &file.path);

    match pool {
        Some(pool) => pool.install(|| files.par_iter().map(parse_fn).collect()),
        None => files.par_iter().map(parse_fn).collect(),
    }
}

/// Parse and resolve one package.
///
/// All files must declare the same package. Files of the external test
/// package (`<name>_test`) are left out.
pub fn parse_package(set: &SourceSet) -> Result<SymbolTable> {
    if set.is_empty() {
        return Err(Error::NoSources {
            origin: set.origin.clone(),
        });
    }

    let parsed = parse_files_parallel(set.files(), None)
        .into_iter()
        .collect::<Result<Vec<_>>>()?;

    let package = package_name(&parsed)?;
    let external_test = format!("{}_test", package);
    let files: Vec<ast::File> = parsed
        .into_iter()
        .filter(|f| {
            let keep = f.package != external_test;
            if !keep {
                tracing::debug!(path = %f.path, "skipping external test file");
            }
            keep
        })
        .collect();

    let table = resolve::resolve(&package, &files)?;
    tracing::debug!(
        origin = %set.origin,
        package = %package,
        files = files.len(),
        symbols = table.len(),
        "resolved package"
    );
    Ok(table)
}

/// The package every file agrees on. External test files may only sit
/// next to files of the package they test.
fn package_name(files: &[ast::File]) -> Result<String> {
    let primary = files
        .iter()
        .map(|f| f.package.as_str())
        .find(|p| !p.ends_with("_test"))
        .or_else(|| files.first().map(|f| f.package.as_str()))
        .unwrap_or_default()
        .to_string();

    let external_test = format!("{}_test", primary);
    for file in files {
        if file.package != primary && file.package != external_test {
            return Err(Error::PackageMismatch {
                first: primary,
                second: file.package.clone(),
            });
        }
    }
    Ok(primary)
}

/// Build the before and after tables concurrently.
pub fn load_pair(before: &SourceSet, after: &SourceSet) -> Result<(SymbolTable, SymbolTable)> {
    let (before, after) = rayon::join(|| parse_package(before), || parse_package(after));
    Ok((before?, after?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_set_sorted() {
        let set = SourceSet::from_files(
            "mem",
            [("b.go", "package p"), ("a.go", "package p"), ("c.go", "package p")],
        );
        let paths: Vec<_> = set.files().iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["a.go", "b.go", "c.go"]);
    }

    #[test]
    fn test_parse_files_parallel_keeps_order() {
        let files: Vec<_> = (0..8)
            .map(|i| SourceFile::new(format!("f{}.go", i), format!("package p\nvar V{} int\n", i)))
            .collect();
        let results = parse_files_parallel(&files, Some(2));
        assert_eq!(results.len(), 8);
        for (i, result) in results.iter().enumerate() {
            let file = result.as_ref().unwrap();
            assert_eq!(file.path, format!("f{}.go", i));
        }
    }

    #[test]
    fn test_parse_package_empty() {
        let err = parse_package(&SourceSet::new("nowhere")).unwrap_err();
        assert!(matches!(err, Error::NoSources { origin } if origin == "nowhere"));
    }

    #[test]
    fn test_parse_package_mismatch() {
        let set = SourceSet::from_files(
            "mem",
            [("a.go", "package alpha\n"), ("b.go", "package beta\n")],
        );
        assert!(matches!(
            parse_package(&set),
            Err(Error::PackageMismatch { .. })
        ));
    }

    #[test]
    fn test_external_test_package_skipped() {
        let set = SourceSet::from_files(
            "mem",
            [
                ("a.go", "package alpha\nfunc A() {}\n"),
                ("a_test.go", "package alpha_test\nfunc TestA() {}\n"),
            ],
        );
        let table = parse_package(&set).unwrap();
        assert_eq!(table.package, "alpha");
        assert_eq!(table.names(), vec!["A"]);
    }

    #[test]
    fn test_load_pair() {
        let before = SourceSet::from_files("old", [("a.go", "package p\nfunc F(int) {}\n")]);
        let after = SourceSet::from_files("new", [("a.go", "package p\nfunc F(int, string) {}\n")]);
        let (b, a) = load_pair(&before, &after).unwrap();
        assert_eq!(b.len(), 1);
        assert_eq!(a.len(), 1);
        assert_eq!(a.types.display(a.lookup("F").unwrap().symbol.ty), "func(int, string)");
    }
}
