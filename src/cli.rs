//! Command handler functions for the covdelta CLI.
//!
//! Each `cmd_*` function returns its output as a `String`, making them easy
//! to test without capturing stdout. Reading files happens in the `load_*`
//! helpers; everything else works on already-ingested stats.

use std::fmt::Write;
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use log::warn;
use serde::Serialize;

use crate::changeset::{self, TouchedFile};
use crate::compare::{compare_file, compare_totals, ChangeKind, MetricComparison};
use crate::config::{Config, IngestOptions};
use crate::filter::{filter_stats, FileFilter};
use crate::ingest;
use crate::model::{MetricKind, MetricSet, ProjectStats, Ratio};
use crate::threshold::{check_thresholds, Thresholds};

/// Output style shared by every command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Read and ingest a Clover report, optionally restricted to a change-set.
pub fn load_report(
    path: &Path,
    options: &IngestOptions,
    touched: Option<&[TouchedFile]>,
) -> Result<ProjectStats> {
    let xml = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read report {}", path.display()))?;
    let stats = match touched {
        Some(touched) => ingest::ingest_changes(&xml, touched, options),
        None => ingest::ingest(&xml, options),
    }
    .with_context(|| format!("Failed to ingest {}", path.display()))?;

    if stats.file_count() == 0 {
        warn!("{} contains no files in scope", path.display());
    }
    Ok(stats)
}

/// Read a change-set JSON file.
pub fn load_change_set(path: &Path) -> Result<Vec<TouchedFile>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read change-set {}", path.display()))?;
    let touched = changeset::parse_touched_files(&text)
        .with_context(|| format!("Failed to parse change-set {}", path.display()))?;
    Ok(touched)
}

/// Read a JSON settings file.
pub fn load_config(path: &Path) -> Result<Config> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    Ok(Config::from_json(&text)?)
}

/// Parse `METRIC:MIN:MAX` into a percentage-range filter.
pub fn parse_range_arg(arg: &str) -> Result<FileFilter<'static>> {
    let parts: Vec<&str> = arg.split(':').collect();
    let [metric, min, max] = parts.as_slice() else {
        bail!("Invalid range '{arg}', expected METRIC:MIN:MAX");
    };
    let min: f64 = min
        .parse()
        .with_context(|| format!("Invalid minimum in range '{arg}'"))?;
    let max: f64 = max
        .parse()
        .with_context(|| format!("Invalid maximum in range '{arg}'"))?;
    Ok(FileFilter::percent_range(metric, min, max)?)
}

/// Parse `METRIC:DELTA` into a delta-magnitude filter against `baseline`.
pub fn parse_delta_arg<'a>(arg: &str, baseline: &'a ProjectStats) -> Result<FileFilter<'a>> {
    let Some((metric, delta)) = arg.split_once(':') else {
        bail!("Invalid delta '{arg}', expected METRIC:DELTA");
    };
    let delta: f64 = delta
        .parse()
        .with_context(|| format!("Invalid delta in '{arg}'"))?;
    Ok(FileFilter::delta_magnitude(metric, delta, baseline)?)
}

fn write_ratio(out: &mut String, label: &str, ratio: &Ratio) -> std::fmt::Result {
    writeln!(
        out,
        "{:<11} {}/{} ({:.2}%)",
        format!("{label}:"),
        ratio.covered(),
        ratio.total(),
        ratio.percent()
    )
}

fn write_totals(out: &mut String, total: &MetricSet) -> std::fmt::Result {
    write_ratio(out, "Lines", &total.lines)?;
    write_ratio(out, "Methods", &total.methods)?;
    write_ratio(out, "Branches", &total.branches)
}

pub fn cmd_summary(stats: &ProjectStats, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(stats)? + "\n");
    }

    let mut out = String::new();
    writeln!(out, "Folders:    {}", stats.folders.len())?;
    writeln!(out, "Files:      {}", stats.file_count())?;
    write_totals(&mut out, &stats.total)?;
    Ok(out)
}

#[derive(Serialize)]
struct FileRow<'a> {
    path: String,
    metrics: &'a MetricSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    change: Option<ChangeKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delta_percent: Option<f64>,
}

/// Per-file listing, filtered, with change classification when a baseline
/// is available.
pub fn cmd_files(
    stats: &ProjectStats,
    baseline: Option<&ProjectStats>,
    filters: &[FileFilter<'_>],
    metric: MetricKind,
    format: OutputFormat,
) -> Result<String> {
    let filtered = filter_stats(stats.clone(), filters);

    let rows: Vec<FileRow<'_>> = filtered
        .files()
        .map(|(folder, file)| {
            let comparison = baseline.map(|b| compare_file(&folder.name, file, b, metric));
            let (change, delta_percent) = match comparison {
                None => (None, None),
                Some(None) => (Some(ChangeKind::New), None),
                Some(Some(c)) => (Some(c.kind), Some(c.delta_percent)),
            };
            FileRow {
                path: folder.path_of(&file.name),
                metrics: &file.metrics,
                change,
                delta_percent,
            }
        })
        .collect();

    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(&rows)? + "\n");
    }

    let mut out = String::new();
    if rows.is_empty() {
        writeln!(out, "No files match.")?;
        return Ok(out);
    }

    writeln!(
        out,
        "{:<60} {:>8} {:>8} {:>8}  CHANGE",
        "FILE", "TOTAL", "COVERED", "RATE"
    )?;
    writeln!(out, "{}", "-".repeat(96))?;

    for row in &rows {
        let ratio = row.metrics.get(metric);
        let change = match (row.change, row.delta_percent) {
            (Some(kind), Some(delta)) if kind != ChangeKind::Equal => format!("{kind} ({delta:+.2}%)"),
            (Some(kind), _) => kind.to_string(),
            (None, _) => String::new(),
        };
        writeln!(
            out,
            "{:<60} {:>8} {:>8} {:>7.2}%  {}",
            row.path,
            ratio.total(),
            ratio.covered(),
            ratio.percent(),
            change
        )?;
    }

    Ok(out)
}

/// Result of the `check` command.
#[derive(Debug)]
pub struct CheckOutcome {
    pub output: String,
    pub violations: Vec<String>,
}

impl CheckOutcome {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

#[derive(Serialize)]
struct CheckReport<'a> {
    total: &'a MetricSet,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    comparison: Vec<(MetricKind, MetricComparison)>,
    violations: &'a [String],
}

/// Compare totals against the baseline and evaluate the thresholds.
pub fn cmd_check(
    current: &ProjectStats,
    baseline: Option<&ProjectStats>,
    limits: &Thresholds,
    format: OutputFormat,
) -> Result<CheckOutcome> {
    let violations: Vec<String> = check_thresholds(current, baseline, limits).collect();
    let comparison = baseline
        .map(|b| compare_totals(&current.total, &b.total).to_vec())
        .unwrap_or_default();

    if format == OutputFormat::Json {
        let report = CheckReport {
            total: &current.total,
            comparison,
            violations: &violations,
        };
        let output = serde_json::to_string_pretty(&report)? + "\n";
        return Ok(CheckOutcome { output, violations });
    }

    let mut out = String::new();
    write_totals(&mut out, &current.total)?;

    if !comparison.is_empty() {
        out.push('\n');
        for (metric, c) in &comparison {
            writeln!(
                out,
                "{:<11} {} ({:+.2}%)",
                format!("{}:", metric.label()),
                c.kind,
                c.delta_percent
            )?;
        }
    }

    out.push('\n');
    if violations.is_empty() {
        writeln!(out, "All coverage thresholds passed.")?;
    } else {
        for v in &violations {
            writeln!(out, "✗ {v}")?;
        }
    }

    Ok(CheckOutcome {
        output: out,
        violations,
    })
}
