#![allow(dead_code)]

use covdelta::config::IngestOptions;
use covdelta::model::ProjectStats;

pub const WORKSPACE: &str = "/home/runner/work/app/app";

pub const CURRENT_XML: &str = include_str!("../fixtures/clover.xml");
pub const BASELINE_XML: &str = include_str!("../fixtures/clover_baseline.xml");
pub const MALFORMED_XML: &str = include_str!("../fixtures/malformed_clover.xml");
pub const FEATURE_DIFF: &str = include_str!("../fixtures/feature.diff");
pub const CHANGES_JSON: &str = include_str!("../fixtures/changes.json");

pub fn options() -> IngestOptions {
    IngestOptions::with_workspace(WORKSPACE)
}

/// The current report, ingested with the fixture workspace prefix.
pub fn current() -> ProjectStats {
    covdelta::ingest::ingest(CURRENT_XML, &options()).unwrap()
}

/// The baseline report, ingested with the fixture workspace prefix.
pub fn baseline() -> ProjectStats {
    covdelta::ingest::ingest(BASELINE_XML, &options()).unwrap()
}

/// Full relative paths of every file, in iteration order.
pub fn paths(stats: &ProjectStats) -> Vec<String> {
    stats
        .files()
        .map(|(folder, file)| folder.path_of(&file.name))
        .collect()
}

/// Minimal single-package report with the given `(name, statements, covered)` files.
pub fn single_package(files: &[(&str, u64, u64)]) -> String {
    let statements: u64 = files.iter().map(|f| f.1).sum();
    let covered: u64 = files.iter().map(|f| f.2).sum();
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<coverage generated="1" clover="3.2.0">
  <project name="app">
    <metrics statements="{statements}" coveredstatements="{covered}" conditionals="0" coveredconditionals="0" methods="0" coveredmethods="0"/>
    <package name="src">
"#
    );
    for (name, total, hit) in files {
        xml.push_str(&format!(
            r#"      <file name="{name}" path="src/{name}">
        <metrics statements="{total}" coveredstatements="{hit}" conditionals="0" coveredconditionals="0" methods="0" coveredmethods="0"/>
      </file>
"#
        ));
    }
    xml.push_str("    </package>\n  </project>\n</coverage>\n");
    xml
}
