//! Command-line interface for dirsort.
//!
//! This module parses arguments, merges them over the configuration file,
//! and runs either the organize pass or the dry run, printing the results.

use crate::config::{DispatchMode, OrganizerConfig};
use crate::error::{OrganizeError, OrganizeResult};
use crate::output::OutputFormatter;
use crate::scanner::{Organizer, RunReport};
use clap::{CommandFactory, Parser};
use std::path::PathBuf;

/// Sort a folder into images/, video/, documents/, audio/, archives/ and
/// "other files/", transliterating Cyrillic names and unpacking archives.
#[derive(Debug, Clone, Parser)]
#[command(name = "dirsort", version, about)]
pub struct Cli {
    /// Directory to organize.
    pub path: Option<PathBuf>,

    /// Configuration file (TOML).
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Worker threads; 0 uses every core.
    #[arg(short = 'j', long, value_name = "N")]
    pub workers: Option<usize>,

    /// Process folders one at a time on the main thread.
    #[arg(long)]
    pub sequential: bool,

    /// Show what would happen without changing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Hide the progress bar.
    #[arg(long)]
    pub no_progress: bool,

    /// More diagnostics on stderr (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Loads the configuration file and applies command-line overrides.
    pub fn resolve_config(&self) -> OrganizeResult<OrganizerConfig> {
        let mut config = OrganizerConfig::load(self.config.as_deref())?;
        if let Some(workers) = self.workers {
            config.organizer.workers = workers;
        }
        if self.sequential {
            config.organizer.mode = DispatchMode::Sequential;
        }
        if self.no_progress {
            config.organizer.show_progress = false;
        }
        Ok(config)
    }
}

/// Prints the usage text to stderr.
pub fn print_usage() {
    eprintln!("{}", Cli::command().render_usage());
    eprintln!("Give the directory to organize, e.g. `dirsort ~/Downloads`.");
}

/// Runs the command described by `cli`.
///
/// A missing path is [`OrganizeError::MissingArgument`], which the binary
/// answers with the usage text and a clean exit. An invalid root or a broken
/// configuration file is returned as an error.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use dirsort::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["dirsort", "/path/to/directory"]);
/// match run_cli(&cli) {
///     Ok(()) => println!("done"),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(cli: &Cli) -> OrganizeResult<()> {
    let root = require_path(cli)?;

    let config = cli.resolve_config()?;
    let mut organizer = Organizer::new(root, &config)?;

    if cli.dry_run {
        dry_run(&mut organizer)
    } else {
        organize(&mut organizer)
    }
}

/// Returns the directory argument, or [`OrganizeError::MissingArgument`].
pub fn require_path(cli: &Cli) -> OrganizeResult<&std::path::Path> {
    cli.path.as_deref().ok_or(OrganizeError::MissingArgument)
}

fn organize(organizer: &mut Organizer) -> OrganizeResult<()> {
    OutputFormatter::info(&format!(
        "Organizing contents of: {}",
        organizer.root().display()
    ));
    let report = organizer.run()?;
    print_report(&report);
    Ok(())
}

fn dry_run(organizer: &mut Organizer) -> OrganizeResult<()> {
    OutputFormatter::dry_run_notice(&format!(
        "Analyzing contents of: {}",
        organizer.root().display()
    ));
    let plan = organizer.plan()?;
    if plan.is_empty() {
        OutputFormatter::info("No files found to organize.");
        return Ok(());
    }

    let root = organizer.root();
    let mut counts = std::collections::BTreeMap::new();
    for planned in &plan {
        let from = planned.source.strip_prefix(root).unwrap_or(&planned.source);
        let to = planned
            .destination
            .strip_prefix(root)
            .unwrap_or(&planned.destination);
        println!(" - {} → {}", from.display(), to.display());
        *counts
            .entry(planned.route.category.dir_name().to_string())
            .or_insert(0) += 1;
    }

    OutputFormatter::summary_table(&counts, plan.len());
    OutputFormatter::extensions(
        &organizer.registry().known(),
        &organizer.registry().undefined(),
    );
    OutputFormatter::dry_run_notice("No files were modified.");
    Ok(())
}

fn print_report(report: &RunReport) {
    OutputFormatter::summary_table(&report.per_category, report.relocated());
    OutputFormatter::extensions(&report.known_extensions, &report.undefined_extensions);

    if report.extracted > 0 {
        OutputFormatter::success(&format!("Unpacked {} archive(s)", report.extracted));
    }
    if !report.removed_dirs.is_empty() {
        OutputFormatter::success(&format!(
            "Removed {} empty folder(s)",
            report.removed_dirs.len()
        ));
    }
    if report.excluded > 0 {
        OutputFormatter::info(&format!("{} file(s) left in place by filters", report.excluded));
    }

    for skipped in &report.skipped {
        OutputFormatter::warning(&format!("Skipped: {}", skipped));
    }
    for leftover in &report.cleanup_failures {
        OutputFormatter::warning(&leftover.to_string());
    }
    for failed in &report.failed {
        OutputFormatter::error(&failed.to_string());
    }
    for failure in &report.task_failures {
        OutputFormatter::error(&format!(
            "{}: {}",
            failure.unit.display(),
            failure.error
        ));
    }

    if report.is_success() {
        OutputFormatter::success("Organization complete!");
    } else {
        OutputFormatter::warning("Some files could not be organized. Please review errors above.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_path_and_flags() {
        let cli = Cli::parse_from(["dirsort", "/tmp/in", "-j", "4", "--sequential", "-vv"]);
        assert_eq!(cli.path, Some(PathBuf::from("/tmp/in")));
        assert_eq!(cli.workers, Some(4));
        assert!(cli.sequential);
        assert_eq!(cli.verbose, 2);
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_path_is_optional() {
        let cli = Cli::parse_from(["dirsort"]);
        assert!(cli.path.is_none());
        assert!(matches!(require_path(&cli), Err(OrganizeError::MissingArgument)));
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "dirsort",
            "/tmp/in",
            "--workers",
            "2",
            "--sequential",
            "--no-progress",
            "--config",
            "/definitely/missing.toml",
        ]);
        assert!(cli.resolve_config().is_err());

        let tmp = TempDir::new().expect("Failed to create temp directory");
        let config_path = tmp.path().join("dirsort.toml");
        fs::write(
            &config_path,
            "[organizer]\nmode = \"parallel\"\nworkers = 8\nshow_progress = true\n",
        )
        .unwrap();

        let cli = Cli {
            config: Some(config_path),
            ..cli
        };
        let config = cli.resolve_config().expect("config should load");
        assert_eq!(config.organizer.workers, 2);
        assert_eq!(config.organizer.mode, DispatchMode::Sequential);
        assert!(!config.organizer.show_progress);
    }

    #[test]
    fn test_config_file_used_without_flags() {
        let tmp = TempDir::new().expect("Failed to create temp directory");
        let config_path = tmp.path().join("dirsort.toml");
        fs::write(&config_path, "[organizer]\nworkers = 3\n").unwrap();

        let cli = Cli::parse_from(["dirsort", "/tmp/in", "-c", config_path.to_str().unwrap()]);
        let config = cli.resolve_config().expect("config should load");
        assert_eq!(config.organizer.workers, 3);
        assert_eq!(config.organizer.mode, DispatchMode::Parallel);
        assert!(config.organizer.show_progress);
    }

    #[test]
    fn test_missing_path_is_a_usage_error() {
        let cli = Cli::parse_from(["dirsort"]);
        let err = run_cli(&cli).unwrap_err();
        assert!(err.is_usage_error());
    }
}
