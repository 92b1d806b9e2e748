//! Deltas between a current and a baseline `ProjectStats`. Positive deltas
//! mean coverage improved.

use serde::Serialize;

use crate::model::{round2, FileRecord, MetricKind, MetricSet, ProjectStats, Ratio};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Equal,
    Increased,
    Decreased,
    /// The file does not exist in the baseline.
    New,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Equal => "equal",
            ChangeKind::Increased => "increased",
            ChangeKind::Decreased => "decreased",
            ChangeKind::New => "new",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricComparison {
    pub kind: ChangeKind,
    /// Difference in percentage points, two decimals.
    pub delta_percent: f64,
}

/// `a.fraction - b.fraction`.
#[must_use]
pub fn delta(a: &Ratio, b: &Ratio) -> f64 {
    a.fraction() - b.fraction()
}

#[must_use]
pub fn compare_metric(current: &Ratio, baseline: &Ratio) -> MetricComparison {
    let d = delta(current, baseline);
    let kind = if current.fraction() == baseline.fraction() {
        ChangeKind::Equal
    } else if d > 0.0 {
        ChangeKind::Increased
    } else {
        ChangeKind::Decreased
    };
    MetricComparison {
        kind,
        delta_percent: round2(d * 100.0),
    }
}

/// Compare one metric of a file against the same folder/name in the
/// baseline. `None` when the baseline has no such file.
#[must_use]
pub fn compare_file(
    folder: &str,
    file: &FileRecord,
    baseline: &ProjectStats,
    kind: MetricKind,
) -> Option<MetricComparison> {
    let previous = baseline.file(folder, &file.name)?;
    Some(compare_metric(
        file.metrics.get(kind),
        previous.metrics.get(kind),
    ))
}

#[must_use]
pub fn classify_file(
    folder: &str,
    file: &FileRecord,
    baseline: &ProjectStats,
    kind: MetricKind,
) -> ChangeKind {
    compare_file(folder, file, baseline, kind).map_or(ChangeKind::New, |c| c.kind)
}

/// Comparison of every metric of two metric sets, in `MetricKind::ALL` order.
#[must_use]
pub fn compare_totals(current: &MetricSet, baseline: &MetricSet) -> [(MetricKind, MetricComparison); 3] {
    MetricKind::ALL.map(|kind| (kind, compare_metric(current.get(kind), baseline.get(kind))))
}
