//! Accepted breaks: symbol-name patterns whose findings are not failures.

use regex::Regex;

use crate::error::{Error, Result};

/// A set of regular expressions matched against symbol names.
#[derive(Clone, Debug, Default)]
pub struct Allowlist {
    patterns: Vec<Regex>,
}

impl Allowlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile patterns. Each one must match the whole name.
    pub fn from_patterns<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                let p = p.as_ref();
                Regex::new(&format!("^(?:{})$", p)).map_err(|source| Error::InvalidPattern {
                    pattern: p.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn allows(&self, name: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(name))
    }
}
