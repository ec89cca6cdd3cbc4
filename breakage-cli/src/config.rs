//! Configuration loading from `.breakagerc.toml`.
//!
//! The file is optional; every setting has a default, and command-line
//! flags take precedence over it.
//!
//! # Example Configuration
//!
//! ```toml
//! [scanner]
//! ignore = ["zz_generated*.go"]
//! include_tests = false
//!
//! [output]
//! format = "table"
//! color = true
//!
//! [check]
//! allow = ["Deprecated.*", "Internal.*"]
//! ```

use serde::Deserialize;
use std::path::Path;

use breakage_core::scanner::ScanOptions;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILENAME: &str = ".breakagerc.toml";

/// Root configuration structure loaded from `.breakagerc.toml`.
#[derive(Debug, Deserialize, Default)]
pub struct BreakageConfig {
    #[serde(default)]
    pub scanner: ScannerConfig,

    #[serde(default)]
    pub output: OutputSettings,

    #[serde(default)]
    pub check: CheckConfig,
}

/// Which files of a package directory are read.
#[derive(Debug, Deserialize, Default)]
pub struct ScannerConfig {
    /// Gitignore-style patterns to skip, on top of `.gitignore` and
    /// `.breakageignore`.
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Read `_test.go` files too. Files of the external `_test` package are
    /// still left out.
    #[serde(default)]
    pub include_tests: bool,
}

/// Output formatting preferences.
///
/// Distinct from the runtime `OutputConfig`, which handles rendering.
#[derive(Debug, Deserialize, Default)]
pub struct OutputSettings {
    /// Default output format: `table`, `json`, `csv` or `names`.
    #[serde(default)]
    pub format: Option<String>,

    /// Force colored output on or off. Unset means auto-detect.
    #[serde(default)]
    pub color: Option<bool>,
}

/// Analysis settings.
#[derive(Debug, Deserialize, Default)]
pub struct CheckConfig {
    /// Regexes over symbol names whose breakage is accepted.
    #[serde(default)]
    pub allow: Vec<String>,
}

impl BreakageConfig {
    /// Load `.breakagerc.toml` from `root`.
    ///
    /// A missing file yields defaults. Unreadable or malformed files are
    /// logged as warnings and also yield defaults.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILENAME);
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse {}: {}", CONFIG_FILENAME, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", CONFIG_FILENAME, e);
                }
            }
        }
        Self::default()
    }

    /// Scanner options for loading package directories.
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            include_tests: self.scanner.include_tests,
            ignore_patterns: self.scanner.ignore.clone(),
            follow_symlinks: false,
        }
    }

    /// Allow patterns from the config followed by those given on the
    /// command line, without duplicates.
    pub fn allow_patterns(&self, extra: &[String]) -> Vec<String> {
        let mut patterns = self.check.allow.clone();
        for pattern in extra {
            if !patterns.contains(pattern) {
                patterns.push(pattern.clone());
            }
        }
        patterns
    }

    pub fn default_format(&self) -> Option<&str> {
        self.output.format.as_deref()
    }

    pub fn use_color(&self) -> Option<bool> {
        self.output.color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = BreakageConfig::default();
        assert!(config.scanner.ignore.is_empty());
        assert!(!config.scanner.include_tests);
        assert!(config.default_format().is_none());
        assert!(config.use_color().is_none());
        assert!(config.check.allow.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[scanner]
ignore = ["zz_*.go", "mock.go"]
include_tests = true

[output]
format = "json"
color = false

[check]
allow = ["^Deprecated"]
"#;
        let config: BreakageConfig = toml::from_str(toml_content).unwrap();

        assert_eq!(config.scanner.ignore, vec!["zz_*.go", "mock.go"]);
        assert_eq!(config.default_format(), Some("json"));
        assert_eq!(config.use_color(), Some(false));

        let options = config.scan_options();
        assert!(options.include_tests);
        assert_eq!(options.ignore_patterns.len(), 2);
        assert!(!options.follow_symlinks);
    }

    #[test]
    fn test_allow_patterns_merge() {
        let config: BreakageConfig = toml::from_str("[check]\nallow = [\"A\", \"B\"]\n").unwrap();
        let merged = config.allow_patterns(&["B".to_string(), "C".to_string()]);
        assert_eq!(merged, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let config = BreakageConfig::load(dir.path());
        assert!(config.default_format().is_none());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "[output]\nformat = \"names\"\n").unwrap();
        let config = BreakageConfig::load(dir.path());
        assert_eq!(config.default_format(), Some("names"));
    }

    #[test]
    fn test_load_malformed_falls_back() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "[output\nformat = ").unwrap();
        let config = BreakageConfig::load(dir.path());
        assert!(config.default_format().is_none());
    }
}
