//! In-memory representation of a Clover report. The parser produces a flat
//! `CoverageData`; grouping turns it into a `ProjectStats` hierarchy of
//! project totals, folders and files.

use std::str::FromStr;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::CoverageError;

/// Round to the four decimal digits a `Ratio` fraction is kept at.
fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Round to two decimal digits.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Convert a fraction into a percentage with two decimals. NaN counts as 0.
#[must_use]
pub fn percent(fraction: f64) -> f64 {
    if fraction.is_nan() {
        0.0
    } else {
        (fraction * 10_000.0).round() / 100.0
    }
}

/// A covered/total pair. An empty ratio (`total == 0`) is fully covered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Ratio {
    total: u64,
    covered: u64,
    fraction: f64,
}

impl Ratio {
    #[must_use]
    pub fn new(total: u64, covered: u64) -> Self {
        let fraction = if total == 0 {
            1.0
        } else {
            round4(covered as f64 / total as f64)
        };
        Self {
            total,
            covered,
            fraction,
        }
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    #[must_use]
    pub fn covered(&self) -> u64 {
        self.covered
    }

    #[must_use]
    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    #[must_use]
    pub fn percent(&self) -> f64 {
        percent(self.fraction)
    }
}

impl Default for Ratio {
    fn default() -> Self {
        Ratio::new(0, 0)
    }
}

impl Ratio {
    /// Sum of two ratios, `None` when a count overflows.
    #[must_use]
    pub fn checked_add(self, rhs: Ratio) -> Option<Ratio> {
        Some(Ratio::new(
            self.total.checked_add(rhs.total)?,
            self.covered.checked_add(rhs.covered)?,
        ))
    }
}

/// Which of the three coverage metrics to look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Lines,
    Methods,
    Branches,
}

impl MetricKind {
    pub const ALL: [MetricKind; 3] = [MetricKind::Lines, MetricKind::Methods, MetricKind::Branches];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Lines => "lines",
            MetricKind::Methods => "methods",
            MetricKind::Branches => "branches",
        }
    }

    /// Capitalized singular form used in messages ("Line coverage ...").
    pub fn label(&self) -> &'static str {
        match self {
            MetricKind::Lines => "Line",
            MetricKind::Methods => "Method",
            MetricKind::Branches => "Branch",
        }
    }
}

impl FromStr for MetricKind {
    type Err = CoverageError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lines" | "line" | "statements" => Ok(MetricKind::Lines),
            "methods" | "method" | "functions" => Ok(MetricKind::Methods),
            "branches" | "branch" | "conditionals" => Ok(MetricKind::Branches),
            _ => Err(CoverageError::Configuration(format!(
                "Unknown metric: '{s}'. Supported: lines, methods, branches"
            ))),
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Line, method and branch coverage of one file or a whole project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetricSet {
    pub lines: Ratio,
    pub methods: Ratio,
    pub branches: Ratio,
}

impl MetricSet {
    #[must_use]
    pub fn get(&self, kind: MetricKind) -> &Ratio {
        match kind {
            MetricKind::Lines => &self.lines,
            MetricKind::Methods => &self.methods,
            MetricKind::Branches => &self.branches,
        }
    }
}

impl MetricSet {
    /// Metric-wise sum, `None` when any count overflows.
    #[must_use]
    pub fn checked_add(self, rhs: MetricSet) -> Option<MetricSet> {
        Some(MetricSet {
            lines: self.lines.checked_add(rhs.lines)?,
            methods: self.methods.checked_add(rhs.methods)?,
            branches: self.branches.checked_add(rhs.branches)?,
        })
    }
}

/// A run of source lines sharing the same covered/uncovered status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineCoverageEntry {
    pub start: u32,
    pub end: u32,
    pub covered: bool,
}

impl LineCoverageEntry {
    #[must_use]
    pub fn covered_percent(&self) -> u8 {
        if self.covered {
            100
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodCoverageEntry {
    pub name: String,
    pub covered: bool,
}

impl MethodCoverageEntry {
    #[must_use]
    pub fn covered_percent(&self) -> u8 {
        if self.covered {
            100
        } else {
            0
        }
    }
}

/// Coverage for a single source file, as read from the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileCoverage {
    /// Canonical path: the `path` attribute, or `name` when absent.
    pub path: String,
    pub metrics: MetricSet,
    pub lines: Vec<LineCoverageEntry>,
    pub methods: Vec<MethodCoverageEntry>,
}

/// The complete result of parsing a single report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoverageData {
    /// Project-level aggregate metrics.
    pub total: MetricSet,
    pub files: Vec<FileCoverage>,
}

/// A file inside a folder. `name` carries no directory component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileRecord {
    pub name: String,
    pub metrics: MetricSet,
    pub lines: Vec<LineCoverageEntry>,
    pub methods: Vec<MethodCoverageEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Folder {
    /// Relative directory path, `""` for the root.
    pub name: String,
    pub files: IndexMap<String, FileRecord>,
}

impl Folder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: IndexMap::new(),
        }
    }

    /// Insert a file, replacing (in place) any file with the same name.
    pub fn insert(&mut self, file: FileRecord) {
        self.files.insert(file.name.clone(), file);
    }

    /// Full path of a file in this folder.
    #[must_use]
    pub fn path_of(&self, file_name: &str) -> String {
        if self.name.is_empty() {
            file_name.to_string()
        } else {
            format!("{}/{}", self.name, file_name)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Root of the hierarchy: project totals plus folders in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectStats {
    pub total: MetricSet,
    pub folders: IndexMap<String, Folder>,
}

impl ProjectStats {
    #[must_use]
    pub fn file(&self, folder: &str, name: &str) -> Option<&FileRecord> {
        self.folders.get(folder)?.files.get(name)
    }

    /// All files, folder by folder.
    pub fn files(&self) -> impl Iterator<Item = (&Folder, &FileRecord)> {
        self.folders
            .values()
            .flat_map(|folder| folder.files.values().map(move |file| (folder, file)))
    }

    #[must_use]
    pub fn file_count(&self) -> usize {
        self.folders.values().map(|f| f.files.len()).sum()
    }
}
