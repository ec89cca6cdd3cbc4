//! Reading package snapshots out of a git repository.
//!
//! Shells out to `git ls-tree` and `git show`; paths are relative to the
//! directory the repository was opened at.

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

use breakage_core::parser::{SourceFile, SourceSet};

#[derive(Error, Debug)]
pub enum GitError {
    #[error("Failed to run git: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Not a git repository: {0}")]
    NotARepository(PathBuf),

    #[error("git {command} failed: {stderr}")]
    Failed { command: String, stderr: String },

    #[error("{path} at {rev} is not valid UTF-8")]
    NotUtf8 { rev: String, path: String },
}

pub type Result<T> = std::result::Result<T, GitError>;

/// Object type of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Blob,
    Tree,
    /// Submodule.
    Commit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: String,
    pub kind: EntryKind,
}

/// A working directory inside a git repository.
#[derive(Debug, Clone)]
pub struct Repository {
    dir: PathBuf,
}

impl Repository {
    pub fn open(dir: &Path) -> Result<Self> {
        let repo = Self {
            dir: dir.to_path_buf(),
        };
        match repo.git(&["rev-parse", "--is-inside-work-tree"]) {
            Ok(_) => Ok(repo),
            Err(GitError::Failed { .. }) => Err(GitError::NotARepository(dir.to_path_buf())),
            Err(e) => Err(e),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn git(&self, args: &[&str]) -> Result<Vec<u8>> {
        tracing::debug!(dir = %self.dir.display(), ?args, "running git");
        let output = Command::new("git").arg("-C").arg(&self.dir).args(args).output()?;

        if !output.status.success() {
            return Err(GitError::Failed {
                command: args.first().copied().unwrap_or_default().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }

    /// Entries of one directory of `rev`, non-recursive.
    pub fn ls_tree(&self, rev: &str, dir: &str) -> Result<Vec<TreeEntry>> {
        let pathspec = format!("{}/", dir.trim_end_matches('/'));
        let mut args = vec!["ls-tree", "-z", rev];
        if !is_current(dir) {
            args.push("--");
            args.push(&pathspec);
        }
        let out = self.git(&args)?;
        Ok(parse_ls_tree(&String::from_utf8_lossy(&out)))
    }

    /// Contents of a file at `rev`.
    pub fn show(&self, rev: &str, path: &str) -> Result<String> {
        let out = self.git(&["show", &format!("{}:./{}", rev, path)])?;
        String::from_utf8(out).map_err(|_| GitError::NotUtf8 {
            rev: rev.to_string(),
            path: path.to_string(),
        })
    }

    /// The Go files of the package directory `dir` at `rev`.
    pub fn package_sources(&self, rev: &str, dir: &str, include_tests: bool) -> Result<SourceSet> {
        let mut set = SourceSet::new(format!("{}:{}", rev, dir));
        for entry in self.ls_tree(rev, dir)? {
            if entry.kind != EntryKind::Blob {
                continue;
            }
            let Some(name) = Path::new(&entry.path).file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.ends_with(".go") || (!include_tests && name.ends_with("_test.go")) {
                continue;
            }
            let source = self.show(rev, &entry.path)?;
            set.push(SourceFile::new(name, source));
        }
        tracing::debug!(rev, dir, files = set.len(), "loaded package from git");
        Ok(set)
    }
}

fn is_current(dir: &str) -> bool {
    dir.is_empty() || dir == "." || dir == "./"
}

/// Parse `git ls-tree -z` output: `<mode> SP <type> SP <object> TAB <path>`
/// records separated by NUL.
fn parse_ls_tree(output: &str) -> Vec<TreeEntry> {
    output
        .split('\0')
        .filter_map(|record| {
            let (meta, path) = record.split_once('\t')?;
            let kind = match meta.split_whitespace().nth(1)? {
                "blob" => EntryKind::Blob,
                "tree" => EntryKind::Tree,
                "commit" => EntryKind::Commit,
                _ => return None,
            };
            Some(TreeEntry {
                path: path.to_string(),
                kind,
            })
        })
        .collect()
}
