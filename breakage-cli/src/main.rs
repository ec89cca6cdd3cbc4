//! breakage CLI - reports API breaking changes between two versions of a
//! Go package.
//!
//! Exit status is 0 when nothing breaks, 1 when breaking changes were found
//! and 2 when the comparison could not be made.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use breakage_core::differ::Allowlist;

mod commands;
mod config;
mod git;
mod output;

use commands::CheckOptions;
use config::BreakageConfig;
use output::{OutputConfig, OutputFormat, Outputter};

/// Report API breaking changes in Go packages.
///
/// A change is breaking when an exported name of the old package is gone,
/// declares a different kind of entity, or has a type that existing callers
/// can no longer use the same way.
#[derive(Parser)]
#[command(name = "breakage")]
#[command(author, version)]
#[command(about = "Report API breaking changes in Go packages")]
#[command(propagate_version = true)]
#[command(after_help = "Examples:
  breakage compare ./v1/api ./v2/api     Compare two package directories
  breakage git v1.4.0                    Compare a tag with the working tree
  breakage git main HEAD --path pkg/api  Compare two revisions of one package

Exit status: 0 no breaking changes, 1 breaking changes found, 2 error.")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Output format (overrides config default)
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Accept breaking changes to names matching this regex (repeatable)
    #[arg(long = "allow", global = true, value_name = "REGEX")]
    allow: Vec<String>,

    /// Also read _test.go files
    #[arg(long, global = true)]
    include_tests: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Compact output: single-line JSON, borderless tables
    #[arg(long, global = true)]
    compact: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two package directories
    Compare {
        /// Directory of the old package
        old: PathBuf,

        /// Directory of the new package
        new: PathBuf,
    },

    /// Compare a package across git revisions
    Git {
        /// Base tree-ish (branch, tag, commit)
        base: String,

        /// Head tree-ish; the working tree when omitted
        head: Option<String>,

        /// Package directory, relative to the repository directory
        #[arg(short, long, default_value = ".")]
        path: String,

        /// Directory to run git in
        #[arg(short = 'C', long, default_value = ".")]
        repo: PathBuf,
    },
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = BreakageConfig::load(Path::new("."));

    // CLI flag > config default > table
    let format = cli.format.unwrap_or_else(|| {
        config
            .default_format()
            .and_then(|f| match f.parse::<OutputFormat>() {
                Ok(format) => Some(format),
                Err(e) => {
                    tracing::warn!("{}", e);
                    None
                }
            })
            .unwrap_or_default()
    });

    let mut output_config = OutputConfig::auto_detect(format, config.use_color());
    if cli.no_color {
        output_config = output_config.without_colors();
    }
    if cli.compact {
        output_config = output_config.compact();
    }
    colored::control::set_override(output_config.use_colors());

    let mut scan = config.scan_options();
    scan.include_tests |= cli.include_tests;
    let options = CheckOptions {
        allow: Allowlist::from_patterns(config.allow_patterns(&cli.allow))
            .context("Invalid allow pattern")?,
        scan,
    };

    let report = match &cli.command {
        Commands::Compare { old, new } => commands::compare::run(old, new, &options)?,
        Commands::Git {
            base,
            head,
            path,
            repo,
        } => commands::git::run(repo, base, head.as_deref(), path, &options)?,
    };

    tracing::debug!(
        findings = report.findings.len(),
        allowed = report.allowed.len(),
        duration_ms = report.duration_ms,
        "analysis complete"
    );

    report.output(&output_config);
    Ok(report.is_breaking())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::from(1),
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_git_arguments() {
        let cli = Cli::try_parse_from([
            "breakage", "git", "v1.0.0", "--path", "pkg/api", "--allow", "^Old", "--allow",
            "Legacy",
        ])
        .unwrap();
        assert_eq!(cli.allow, vec!["^Old", "Legacy"]);
        match cli.command {
            Commands::Git { base, head, path, .. } => {
                assert_eq!(base, "v1.0.0");
                assert!(head.is_none());
                assert_eq!(path, "pkg/api");
            }
            _ => panic!("expected git command"),
        }
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["breakage", "-v", "-q", "compare", "a", "b"]).is_err());
    }
}
