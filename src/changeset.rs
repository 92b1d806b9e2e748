//! Change-set attribution: restrict a `ProjectStats` to the files touched by
//! a change (e.g. a pull request) and estimate how well the touched lines
//! are covered.
//!
//! Clover only gives aggregate counts per file, so the estimate scales each
//! file's aggregates by the share of its statements that were touched:
//!
//! ```text
//! proportion = touched lines / file statements      (1 when statements = 0)
//! estimated  = round(total   × proportion)
//! covered    = round(covered × proportion)
//! ```
//!
//! The same proportion is applied to statements, methods and conditionals.
//! This is an approximation, not per-line truth.

use std::sync::LazyLock;

use log::{debug, trace};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CoverageError, Result};
use crate::model::{Folder, MetricSet, ProjectStats, Ratio};

/// Matches "12" or "12-40" (whitespace tolerated around the numbers).
static RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\s*(?:-\s*(\d+)\s*)?$").unwrap());

/// One line, or a `"start-end"` range, as it appears in change-set JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LineSpec {
    Line(u32),
    Range(String),
}

impl LineSpec {
    /// Inclusive `(start, end)` bounds.
    pub fn bounds(&self) -> Result<(u32, u32)> {
        match self {
            LineSpec::Line(n) => Ok((*n, *n)),
            LineSpec::Range(text) => {
                let invalid = || CoverageError::Configuration(format!("invalid line range: {text:?}"));
                let caps = RANGE_RE.captures(text).ok_or_else(invalid)?;
                let start: u32 = caps[1].parse().map_err(|_| invalid())?;
                let end: u32 = match caps.get(2) {
                    Some(m) => m.as_str().parse().map_err(|_| invalid())?,
                    None => start,
                };
                if start > end {
                    return Err(invalid());
                }
                Ok((start, end))
            }
        }
    }
}

/// A file touched by a change-set. `lines: None` puts the whole file in scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TouchedFile {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<LineSpec>>,
}

impl TouchedFile {
    pub fn whole(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            lines: None,
        }
    }

    pub fn with_lines(file: impl Into<String>, lines: Vec<LineSpec>) -> Self {
        Self {
            file: file.into(),
            lines: Some(lines),
        }
    }

    /// Resolved ranges, or `None` when the whole file is in scope. An empty
    /// list counts as no line information.
    fn ranges(&self) -> Result<Option<Vec<(u32, u32)>>> {
        match self.lines.as_deref() {
            None | Some([]) => Ok(None),
            Some(specs) => specs
                .iter()
                .map(LineSpec::bounds)
                .collect::<Result<Vec<_>>>()
                .map(Some),
        }
    }

    /// Whether this entry refers to the given normalized path.
    ///
    /// Matching is by substring containment, so `lib/src/a.ts` also matches
    /// a report file `src/a.ts`.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.file.contains(path)
    }
}

/// Parse change-set JSON: `[{"file": "src/a.ts", "lines": [3, "10-12"]}, ...]`.
pub fn parse_touched_files(json: &str) -> Result<Vec<TouchedFile>> {
    let touched: Vec<TouchedFile> = serde_json::from_str(json)
        .map_err(|e| CoverageError::Configuration(format!("invalid change-set: {e}")))?;
    for entry in &touched {
        entry.ranges()?;
    }
    Ok(touched)
}

/// Scale a file's aggregate metrics to the touched share of its statements.
///
/// Fails when a scaled count no longer fits in a `u64`, which happens when
/// the touched lines vastly outnumber the file's statements.
pub fn estimate(metrics: &MetricSet, ranges: &[(u32, u32)]) -> Result<MetricSet> {
    let touched_lines: u64 = ranges
        .iter()
        .map(|&(start, end)| u64::from(end - start) + 1)
        .sum();
    let statements = metrics.lines.total();
    let proportion = if statements == 0 {
        1.0
    } else {
        touched_lines as f64 / statements as f64
    };

    let scale_count = |count: u64| -> Result<u64> {
        let scaled = (count as f64 * proportion).round();
        if scaled < u64::MAX as f64 {
            Ok(scaled as u64)
        } else {
            Err(CoverageError::Configuration(format!(
                "{touched_lines} touched lines scale a count of {count} beyond the representable range"
            )))
        }
    };
    let scale = |ratio: &Ratio| -> Result<Ratio> {
        Ok(Ratio::new(
            scale_count(ratio.total())?,
            scale_count(ratio.covered())?,
        ))
    };

    Ok(MetricSet {
        lines: scale(&metrics.lines)?,
        methods: scale(&metrics.methods)?,
        branches: scale(&metrics.branches)?,
    })
}

/// Restrict `stats` to touched files and recompute the project totals as the
/// sum of each retained file's (possibly estimated) metrics.
///
/// Retained file records are copied unchanged; only `total` is re-derived.
/// Folders without any touched file are left out.
pub fn attribute(stats: &ProjectStats, touched: &[TouchedFile]) -> Result<ProjectStats> {
    let resolved = touched
        .iter()
        .map(|entry| Ok((entry, entry.ranges()?)))
        .collect::<Result<Vec<_>>>()?;

    let mut result = ProjectStats::default();

    for folder in stats.folders.values() {
        for file in folder.files.values() {
            let path = folder.path_of(&file.name);
            let Some((entry, ranges)) = resolved.iter().find(|(entry, _)| entry.matches(&path))
            else {
                continue;
            };

            let contribution = match ranges {
                Some(ranges) => estimate(&file.metrics, ranges)?,
                None => file.metrics,
            };
            trace!(
                "{path}: matched '{}', contributes {}/{} statements",
                entry.file,
                contribution.lines.covered(),
                contribution.lines.total()
            );
            result.total = result.total.checked_add(contribution).ok_or_else(|| {
                CoverageError::malformed(Some(&path), "touched coverage totals overflow")
            })?;

            result
                .folders
                .entry(folder.name.clone())
                .or_insert_with(|| Folder::new(folder.name.clone()))
                .insert(file.clone());
        }
    }

    debug!(
        "change-set retained {} of {} files",
        result.file_count(),
        stats.file_count()
    );
    Ok(result)
}
