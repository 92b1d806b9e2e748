//! Predicates selecting which files are reported. A file is kept only when
//! every active filter accepts it; folders left without files are dropped.

use crate::error::Result;
use crate::model::{percent, round2, FileRecord, MetricKind, ProjectStats};

#[derive(Debug, Clone, Copy)]
pub enum FileFilter<'a> {
    /// Keep files with at least one covered line.
    CoveragePresence,
    /// Keep files with at least one coverable line.
    CoverableLinesPresence,
    /// Keep files whose metric percentage lies within `[min, max]`.
    PercentRange {
        metric: MetricKind,
        min: f64,
        max: f64,
    },
    /// Keep files that are new, or whose metric moved by more than
    /// `min_delta` percentage points since the baseline.
    DeltaMagnitude {
        metric: MetricKind,
        min_delta: f64,
        baseline: &'a ProjectStats,
    },
}

impl<'a> FileFilter<'a> {
    /// `PercentRange` with the metric given by name.
    pub fn percent_range(metric: &str, min: f64, max: f64) -> Result<Self> {
        Ok(FileFilter::PercentRange {
            metric: metric.parse()?,
            min,
            max,
        })
    }

    /// `DeltaMagnitude` with the metric given by name.
    pub fn delta_magnitude(metric: &str, min_delta: f64, baseline: &'a ProjectStats) -> Result<Self> {
        Ok(FileFilter::DeltaMagnitude {
            metric: metric.parse()?,
            min_delta,
            baseline,
        })
    }

    #[must_use]
    pub fn matches(&self, folder: &str, file: &FileRecord) -> bool {
        match *self {
            FileFilter::CoveragePresence => file.metrics.lines.covered() != 0,
            FileFilter::CoverableLinesPresence => file.metrics.lines.total() != 0,
            FileFilter::PercentRange { metric, min, max } => {
                let value = percent(file.metrics.get(metric).fraction());
                min <= value && value <= max
            }
            FileFilter::DeltaMagnitude {
                metric,
                min_delta,
                baseline,
            } => match baseline.file(folder, &file.name) {
                None => true,
                Some(previous) => {
                    let now = percent(file.metrics.get(metric).fraction());
                    let before = percent(previous.metrics.get(metric).fraction());
                    round2(now - before).abs() > min_delta
                }
            },
        }
    }
}

/// Keep only the files accepted by every filter. Totals are left untouched.
#[must_use]
pub fn filter_stats(mut stats: ProjectStats, filters: &[FileFilter<'_>]) -> ProjectStats {
    if filters.is_empty() {
        return stats;
    }
    for folder in stats.folders.values_mut() {
        let name = folder.name.clone();
        folder
            .files
            .retain(|_, file| filters.iter().all(|f| f.matches(&name, file)));
    }
    stats.folders.retain(|_, folder| !folder.is_empty());
    stats
}
