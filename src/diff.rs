//! Parse a unified diff to extract which lines were added in each file, and
//! turn that into a change-set for attribution.
//!
//! Also provides a [`DiffSource`] trait that abstracts over different
//! ways to obtain a diff (stdin, a file, git).
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result};

use crate::changeset::{LineSpec, TouchedFile};

// ---------------------------------------------------------------------------
// Diff sources
// ---------------------------------------------------------------------------

/// A source for obtaining a unified diff.
pub trait DiffSource {
    /// Fetch the diff text.
    fn fetch_diff(&self) -> Result<String>;
}

/// Diff from stdin.
pub struct StdinDiff;

impl DiffSource for StdinDiff {
    fn fetch_diff(&self) -> Result<String> {
        std::io::read_to_string(std::io::stdin()).context("Failed to read diff from stdin")
    }
}

/// Diff saved to a file.
pub struct FileDiff {
    pub path: PathBuf,
}

impl DiffSource for FileDiff {
    fn fetch_diff(&self) -> Result<String> {
        std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read diff from {}", self.path.display()))
    }
}

/// Diff from a git command (e.g., `git diff HEAD~1`).
pub struct GitDiff {
    /// Arguments to pass to `git diff`.
    pub args: String,
}

impl DiffSource for GitDiff {
    fn fetch_diff(&self) -> Result<String> {
        let diff_args: Vec<&str> = self.args.split_whitespace().collect();
        let output = Command::new("git")
            .arg("diff")
            .args(&diff_args)
            .output()
            .context("Failed to run git diff")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("git diff failed: {stderr}");
        }

        String::from_utf8(output.stdout).context("git diff output not valid UTF-8")
    }
}

// ---------------------------------------------------------------------------
// Diff parsing
// ---------------------------------------------------------------------------

/// Line counts announced by a hunk header
/// `@@ -old_start[,old_count] +new_start[,new_count] @@`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HunkHeader {
    old_count: u32,
    new_start: u32,
    new_count: u32,
}

/// Parse a unified diff (e.g., `git diff`) and return a map of
/// file path -> list of added line numbers (in the new file).
///
/// Hunk bodies are consumed by the line counts in their header, so an added
/// line whose content starts with `++ ` is never mistaken for a file header.
pub fn parse_diff(diff_text: &str) -> BTreeMap<String, Vec<u32>> {
    let mut result: BTreeMap<String, Vec<u32>> = BTreeMap::new();
    let mut current_file: Option<String> = None;
    let mut new_line_number: u32 = 0;
    let mut old_remaining: u32 = 0;
    let mut new_remaining: u32 = 0;

    for line in diff_text.lines() {
        if old_remaining > 0 || new_remaining > 0 {
            match line.as_bytes().first() {
                // "\ No newline at end of file" is diff metadata, not a line
                Some(b'\\') => {}
                Some(b'+') => {
                    if let Some(file) = &current_file {
                        result.entry(file.clone()).or_default().push(new_line_number);
                    }
                    new_line_number = new_line_number.saturating_add(1);
                    new_remaining = new_remaining.saturating_sub(1);
                }
                Some(b'-') => old_remaining = old_remaining.saturating_sub(1),
                _ => {
                    new_line_number = new_line_number.saturating_add(1);
                    old_remaining = old_remaining.saturating_sub(1);
                    new_remaining = new_remaining.saturating_sub(1);
                }
            }
        } else if let Some(rest) = line.strip_prefix("+++ ") {
            if rest == "/dev/null" {
                current_file = None; // File was deleted
            } else {
                // Strip common VCS prefixes: "b/" (default git), "a/" (some tools).
                let path = rest
                    .strip_prefix("b/")
                    .or_else(|| rest.strip_prefix("a/"))
                    .unwrap_or(rest);
                current_file = Some(path.to_string());
            }
        } else if let Some(hunk) = parse_hunk_header(line) {
            new_line_number = hunk.new_start;
            old_remaining = hunk.old_count;
            new_remaining = hunk.new_count;
        }
        // Anything else between hunks ("diff --git", "index", "---", a
        // trailing "\ No newline") is file header noise.
    }

    result
}

/// Parse a hunk header like "@@ -10,5 +20,8 @@". An omitted count means 1.
fn parse_hunk_header(line: &str) -> Option<HunkHeader> {
    let after_at = line.strip_prefix("@@ ")?;
    let mut parts = after_at.split(' ');
    let old_part = parts.next()?.strip_prefix('-')?;
    let new_part = parts.next()?.strip_prefix('+')?;
    let (_, old_count) = parse_hunk_range(old_part)?;
    let (new_start, new_count) = parse_hunk_range(new_part)?;
    Some(HunkHeader {
        old_count,
        new_start,
        new_count,
    })
}

fn parse_hunk_range(range: &str) -> Option<(u32, u32)> {
    match range.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}

/// Coalesce sorted, deduplicated line numbers into inclusive `(start, end)`
/// runs of consecutive lines.
#[must_use]
pub fn coalesce_ranges(lines: &[u32]) -> Vec<(u32, u32)> {
    let mut ranges: Vec<(u32, u32)> = Vec::new();
    for &line in lines {
        match ranges.last_mut() {
            Some((_, end)) if end.checked_add(1) == Some(line) => *end = line,
            _ => ranges.push((line, line)),
        }
    }
    ranges
}

/// Build a change-set from parsed diff lines. Files appear in path order.
#[must_use]
pub fn touched_files(diff_lines: &BTreeMap<String, Vec<u32>>) -> Vec<TouchedFile> {
    diff_lines
        .iter()
        .map(|(path, lines)| {
            let specs = coalesce_ranges(lines)
                .into_iter()
                .map(|(start, end)| {
                    if start == end {
                        LineSpec::Line(start)
                    } else {
                        LineSpec::Range(format!("{start}-{end}"))
                    }
                })
                .collect();
            TouchedFile::with_lines(path.clone(), specs)
        })
        .collect()
}
