use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};

use covdelta::changeset::TouchedFile;
use covdelta::cli::{self, OutputFormat};
use covdelta::config::{Config, IngestOptions};
use covdelta::diff::{self, DiffSource, FileDiff, GitDiff, StdinDiff};
use covdelta::filter::FileFilter;
use covdelta::model::{MetricKind, ProjectStats};
use covdelta::threshold::Thresholds;

/// covdelta: Clover coverage summaries, baseline comparison and threshold checks.
#[derive(Parser)]
#[command(name = "covdelta", version, about)]
struct Cli {
    /// Workspace prefix stripped from report paths.
    #[arg(long, global = true, env = "GITHUB_WORKSPACE")]
    workspace: Option<String>,

    /// JSON settings file (workspace prefix and thresholds).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Restrict the report to a set of touched files and lines.
#[derive(Args)]
struct ChangeSetArgs {
    /// JSON change-set: `[{"file": "src/a.ts", "lines": ["1-4", 9]}]`.
    #[arg(long, conflicts_with_all = ["diff", "git_diff"])]
    changes: Option<PathBuf>,

    /// Unified diff file whose added lines form the change-set ("-" for stdin).
    #[arg(long, conflicts_with = "git_diff")]
    diff: Option<PathBuf>,

    /// Arguments for `git diff`, e.g. "main...HEAD".
    #[arg(long)]
    git_diff: Option<String>,
}

#[derive(Args)]
struct ThresholdArgs {
    /// Fail when line coverage is below this percentage.
    #[arg(long)]
    min_line_coverage: Option<f64>,

    /// Fail when method coverage is below this percentage.
    #[arg(long)]
    min_method_coverage: Option<f64>,

    /// Fail when line coverage dropped by at least this many points.
    #[arg(long)]
    max_line_coverage_decrease: Option<f64>,

    /// Fail when method coverage dropped by at least this many points.
    #[arg(long)]
    max_method_coverage_decrease: Option<f64>,
}

impl From<ThresholdArgs> for Thresholds {
    fn from(args: ThresholdArgs) -> Self {
        Thresholds {
            min_line_coverage: args.min_line_coverage,
            min_method_coverage: args.min_method_coverage,
            max_line_coverage_decrease: args.max_line_coverage_decrease,
            max_method_coverage_decrease: args.max_method_coverage_decrease,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show project totals for a report.
    Summary {
        /// Path to the Clover XML report.
        report: PathBuf,

        #[command(flatten)]
        changes: ChangeSetArgs,
    },

    /// List per-file coverage, optionally compared against a baseline.
    Files {
        /// Path to the Clover XML report.
        report: PathBuf,

        /// Baseline Clover report to compare against.
        #[arg(long)]
        baseline: Option<PathBuf>,

        #[command(flatten)]
        changes: ChangeSetArgs,

        /// Metric shown in the table and used for change classification.
        #[arg(long, default_value = "lines")]
        metric: MetricKind,

        /// Only files with at least one covered line.
        #[arg(long)]
        covered_only: bool,

        /// Only files with at least one coverable line.
        #[arg(long)]
        coverable_only: bool,

        /// Only files whose metric lies in a range, e.g. "lines:0:80".
        #[arg(long, value_name = "METRIC:MIN:MAX")]
        range: Vec<String>,

        /// Only new files or files whose metric moved by more than DELTA points.
        #[arg(long, value_name = "METRIC:DELTA", requires = "baseline")]
        min_delta: Vec<String>,
    },

    /// Evaluate coverage thresholds. Exits with status 1 on any violation.
    Check {
        /// Path to the Clover XML report.
        report: PathBuf,

        /// Baseline Clover report, required for the decrease checks.
        #[arg(long)]
        baseline: Option<PathBuf>,

        #[command(flatten)]
        changes: ChangeSetArgs,

        #[command(flatten)]
        thresholds: ThresholdArgs,
    },
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Cli::parse();

    let config = match &args.config {
        Some(path) => cli::load_config(path)?,
        None => Config::default(),
    };
    let options = IngestOptions {
        workspace_prefix: args.workspace.clone().or(config.workspace_prefix.clone()),
    };
    let format = args.format;

    match args.command {
        Commands::Summary { report, changes } => {
            let touched = resolve_changes(&changes)?;
            let stats = cli::load_report(&report, &options, touched.as_deref())?;
            print!("{}", cli::cmd_summary(&stats, format)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Files {
            report,
            baseline,
            changes,
            metric,
            covered_only,
            coverable_only,
            range,
            min_delta,
        } => {
            let touched = resolve_changes(&changes)?;
            let stats = cli::load_report(&report, &options, touched.as_deref())?;
            let baseline = load_baseline(baseline.as_deref(), &options)?;

            let mut filters: Vec<FileFilter<'_>> = Vec::new();
            if covered_only {
                filters.push(FileFilter::CoveragePresence);
            }
            if coverable_only {
                filters.push(FileFilter::CoverableLinesPresence);
            }
            for arg in &range {
                filters.push(cli::parse_range_arg(arg)?);
            }
            if let Some(base) = &baseline {
                for arg in &min_delta {
                    filters.push(cli::parse_delta_arg(arg, base)?);
                }
            }

            print!(
                "{}",
                cli::cmd_files(&stats, baseline.as_ref(), &filters, metric, format)?
            );
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check {
            report,
            baseline,
            changes,
            thresholds,
        } => {
            let touched = resolve_changes(&changes)?;
            let stats = cli::load_report(&report, &options, touched.as_deref())?;
            let baseline = load_baseline(baseline.as_deref(), &options)?;
            let limits = config.thresholds.merged_with(thresholds.into());

            if baseline.is_none()
                && (limits.max_line_coverage_decrease.is_some()
                    || limits.max_method_coverage_decrease.is_some())
            {
                warn!("no baseline given, skipping coverage decrease checks");
            }

            let outcome = cli::cmd_check(&stats, baseline.as_ref(), &limits, format)?;
            print!("{}", outcome.output);
            if outcome.passed() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

/// The baseline is always the full report; change-sets only apply to the
/// current one.
fn load_baseline(path: Option<&Path>, options: &IngestOptions) -> Result<Option<ProjectStats>> {
    path.map(|p| cli::load_report(p, options, None).context("Failed to load baseline"))
        .transpose()
}

fn resolve_changes(args: &ChangeSetArgs) -> Result<Option<Vec<TouchedFile>>> {
    if let Some(path) = &args.changes {
        return cli::load_change_set(path).map(Some);
    }

    let source: Box<dyn DiffSource> = match (&args.diff, &args.git_diff) {
        (Some(path), _) if path.as_os_str() == "-" => Box::new(StdinDiff),
        (Some(path), _) => Box::new(FileDiff { path: path.clone() }),
        (None, Some(git_args)) => Box::new(GitDiff {
            args: git_args.clone(),
        }),
        (None, None) => return Ok(None),
    };

    let diff_lines = diff::parse_diff(&source.fetch_diff()?);
    if diff_lines.is_empty() {
        warn!("diff adds no lines, nothing will be attributed");
    }
    let total: usize = diff_lines.values().map(Vec::len).sum();
    info!("diff adds {total} lines across {} files", diff_lines.len());
    Ok(Some(diff::touched_files(&diff_lines)))
}
