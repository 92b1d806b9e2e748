//! Parser for Clover XML coverage reports.
//!
//! Clover XML structure (as produced by `jest --coverageReporters=clover`,
//! PHPUnit, OpenClover, ...):
//!
//! ```text
//!   <coverage generated="..." clover="3.2.0">
//!     <project timestamp="..." name="...">
//!       <metrics statements="..." coveredstatements="..." conditionals="..."
//!                coveredconditionals="..." methods="..." coveredmethods="..."/>
//!       <file name="index.ts" path="/abs/index.ts">          (root-level files)
//!         <metrics .../>
//!         <line num="1" count="5" type="stmt"/>
//!       </file>
//!       <package name="src.utils">
//!         <file name="math.ts" path="/abs/src/utils/math.ts">
//!           <metrics .../>
//!           <line num="3" count="2" type="method" name="add"/>
//!           <line num="5" count="1" type="cond" truecount="1" falsecount="1"/>
//!         </file>
//!       </package>
//!     </project>
//!   </coverage>
//! ```
//!
//! Aggregates are taken from the `<metrics>` nodes verbatim; `<line>`
//! records only feed the per-file line and method detail.
use std::collections::BTreeMap;

use log::{debug, trace};

use super::xml::{parse_document, Element};
use super::ReportParser;
use crate::error::{CoverageError, Result};
use crate::model::*;

/// Clover XML format parser.
pub struct CloverParser;

impl ReportParser for CloverParser {
    fn parse(&self, input: &str) -> Result<CoverageData> {
        parse(input)
    }
}

/// Parse Clover XML text.
pub fn parse(input: &str) -> Result<CoverageData> {
    let root = parse_document(input)?;
    if root.name != "coverage" {
        return Err(CoverageError::malformed(
            None,
            format!("expected <coverage> root element, found <{}>", root.name),
        ));
    }
    let project = root
        .child("project")
        .ok_or_else(|| CoverageError::malformed(None, "missing <project> element"))?;

    let project_metrics = project
        .child("metrics")
        .ok_or_else(|| CoverageError::malformed(None, "missing project <metrics> element"))?;
    let total = metric_set(project_metrics, None)?;

    // Root-level files first, then packaged files in document order.
    let nodes = project.children("file").chain(
        project
            .children("package")
            .flat_map(|package| package.children("file")),
    );

    let mut files = Vec::new();
    for node in nodes {
        files.push(parse_file(node)?);
    }

    debug!("parsed Clover report with {} files", files.len());
    Ok(CoverageData { total, files })
}

fn parse_file(node: &Element) -> Result<FileCoverage> {
    let path = node
        .attr("path")
        .or_else(|| node.attr("name"))
        .ok_or_else(|| CoverageError::malformed(None, "<file> without a name or path"))?
        .to_string();

    let metrics_node = node
        .child("metrics")
        .ok_or_else(|| CoverageError::malformed(Some(&path), "missing <metrics> element"))?;
    let metrics = metric_set(metrics_node, Some(&path))?;

    // Line status keyed by number; a line recorded twice is covered if
    // either record was hit.
    let mut statuses: BTreeMap<u32, bool> = BTreeMap::new();
    let mut methods = Vec::new();

    for line in node.children("line") {
        let Some(count) = line.attr("count") else {
            continue;
        };
        let count: u64 = parse_count(count, "count", Some(&path))?;
        let num_raw = line
            .attr("num")
            .ok_or_else(|| CoverageError::malformed(Some(&path), "<line> without 'num'"))?;
        // Line numbers are 1-based.
        let num = num_raw
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                CoverageError::malformed(
                    Some(&path),
                    format!("'num' is not a line number: {num_raw:?}"),
                )
            })?;

        let covered = count > 0;
        *statuses.entry(num).or_insert(false) |= covered;

        if line.attr("type") == Some("method") {
            let name = line
                .attr("name")
                .or_else(|| line.attr("signature"))
                .map(str::to_owned)
                .unwrap_or_else(|| format!("<anonymous@{num}>"));
            methods.push(MethodCoverageEntry { name, covered });
        }
    }

    let lines = coalesce_lines(statuses);
    trace!(
        "{path}: {} line ranges, {} methods",
        lines.len(),
        methods.len()
    );

    Ok(FileCoverage {
        path,
        metrics,
        lines,
        methods,
    })
}

/// Build the three ratios from a `<metrics>` node.
fn metric_set(node: &Element, file: Option<&str>) -> Result<MetricSet> {
    Ok(MetricSet {
        lines: ratio(node, "statements", "coveredstatements", file)?,
        methods: ratio(node, "methods", "coveredmethods", file)?,
        branches: ratio(node, "conditionals", "coveredconditionals", file)?,
    })
}

fn ratio(node: &Element, total_key: &str, covered_key: &str, file: Option<&str>) -> Result<Ratio> {
    let total = required_count(node, total_key, file)?;
    let covered = required_count(node, covered_key, file)?;
    if covered > total {
        return Err(CoverageError::malformed(
            file,
            format!("{covered_key}={covered} exceeds {total_key}={total}"),
        ));
    }
    Ok(Ratio::new(total, covered))
}

fn required_count(node: &Element, key: &str, file: Option<&str>) -> Result<u64> {
    let raw = node.attr(key).ok_or_else(|| {
        CoverageError::malformed(file, format!("missing '{key}' attribute on <{}>", node.name))
    })?;
    parse_count(raw, key, file)
}

fn parse_count(raw: &str, key: &str, file: Option<&str>) -> Result<u64> {
    raw.trim().parse::<u64>().map_err(|_| {
        CoverageError::malformed(
            file,
            format!("'{key}' is not a non-negative integer: {raw:?}"),
        )
    })
}

/// Merge line statuses (ascending by line number) into runs of equal status.
///
/// Consecutive records with the same status are merged even when line
/// numbers in between carry no record, since those lines are not
/// instrumented. No two neighbouring entries share a status.
#[must_use]
pub fn coalesce_lines(statuses: impl IntoIterator<Item = (u32, bool)>) -> Vec<LineCoverageEntry> {
    let mut entries: Vec<LineCoverageEntry> = Vec::new();

    for (num, covered) in statuses {
        match entries.last_mut() {
            Some(last) if last.covered == covered => last.end = num,
            _ => entries.push(LineCoverageEntry {
                start: num,
                end: num,
                covered,
            }),
        }
    }

    entries
}
