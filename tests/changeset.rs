mod common;

use covdelta::changeset::{attribute, parse_touched_files, LineSpec, TouchedFile};
use covdelta::config::IngestOptions;
use covdelta::diff::{parse_diff, touched_files};
use covdelta::error::CoverageError;
use covdelta::ingest::ingest_changes;
use covdelta::model::Ratio;

#[test]
fn diff_fixture_becomes_change_set() {
    let touched = touched_files(&parse_diff(common::FEATURE_DIFF));
    assert_eq!(
        touched,
        vec![
            TouchedFile::with_lines("README.md", vec![LineSpec::Line(2)]),
            TouchedFile::with_lines(
                "src/utils/math.ts",
                vec![LineSpec::Range("2-3".into()), LineSpec::Range("9-11".into())]
            ),
        ]
    );
}

#[test]
fn attribute_from_diff_estimates_touched_lines() {
    let touched = touched_files(&parse_diff(common::FEATURE_DIFF));
    let stats = ingest_changes(common::CURRENT_XML, &touched, &common::options()).unwrap();

    assert_eq!(common::paths(&stats), vec!["src/utils/math.ts"]);
    // 5 touched lines out of 20 statements.
    assert_eq!(stats.total.lines, Ratio::new(5, 4));
    assert_eq!(stats.total.methods, Ratio::new(1, 1));
    assert_eq!(stats.total.branches, Ratio::new(1, 1));
    assert_eq!(stats.total.lines.percent(), 80.0);

    // File records are carried over unchanged.
    let math = stats.file("src/utils", "math.ts").unwrap();
    assert_eq!(math.metrics.lines, Ratio::new(20, 15));
    assert_eq!(math.lines.len(), 3);
}

#[test]
fn json_change_set_matches_diff_change_set() {
    let from_json = parse_touched_files(common::CHANGES_JSON).unwrap();
    let from_diff = touched_files(&parse_diff(common::FEATURE_DIFF));

    let a = ingest_changes(common::CURRENT_XML, &from_json, &common::options()).unwrap();
    let b = ingest_changes(common::CURRENT_XML, &from_diff, &common::options()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn whole_file_entries_keep_full_metrics() {
    let touched = vec![
        TouchedFile::whole("src/api/client.ts"),
        TouchedFile::with_lines("index.ts", vec![]),
    ];
    let stats = ingest_changes(common::CURRENT_XML, &touched, &common::options()).unwrap();

    assert_eq!(common::paths(&stats), vec!["index.ts", "src/api/client.ts"]);
    assert_eq!(stats.total.lines, Ratio::new(16, 12));
    assert_eq!(stats.total.methods, Ratio::new(3, 2));
}

#[test]
fn touched_path_containing_report_path_matches() {
    let touched = vec![TouchedFile::whole("packages/web/src/utils/strings.ts")];
    let stats = ingest_changes(common::CURRENT_XML, &touched, &common::options()).unwrap();
    assert_eq!(common::paths(&stats), vec!["src/utils/strings.ts"]);
}

#[test]
fn empty_change_set_yields_empty_stats() {
    let stats = ingest_changes(common::CURRENT_XML, &[], &common::options()).unwrap();
    assert_eq!(stats.file_count(), 0);
    assert!(stats.folders.is_empty());
    assert_eq!(stats.total.lines.fraction(), 1.0);
}

#[test]
fn attribution_proportional_to_touched_lines() {
    let xml = common::single_package(&[("big.ts", 100, 40)]);
    let stats = covdelta::ingest::ingest(&xml, &IngestOptions::default()).unwrap();
    let touched = vec![TouchedFile::with_lines(
        "src/big.ts",
        vec![LineSpec::Range("11-20".into())],
    )];
    let attributed = attribute(&stats, &touched).unwrap();
    assert_eq!(attributed.total.lines, Ratio::new(10, 4));
}

#[test]
fn invalid_range_is_configuration_error() {
    let err = parse_touched_files(r#"[{"file": "src/a.ts", "lines": ["9-3"]}]"#).unwrap_err();
    assert!(matches!(err, CoverageError::Configuration(_)));

    let touched = vec![TouchedFile::with_lines(
        "src/utils/math.ts",
        vec![LineSpec::Range("three".into())],
    )];
    let err = ingest_changes(common::CURRENT_XML, &touched, &common::options()).unwrap_err();
    assert!(matches!(err, CoverageError::Configuration(_)));
}

#[test]
fn touched_totals_past_u64_fail_without_panicking() {
    let xml = r#"<coverage clover="3.2.0"><project>
<metrics statements="18446744073709551615" coveredstatements="0" conditionals="0" coveredconditionals="0" methods="0" coveredmethods="0"/>
<package name="src">
  <file name="a.ts" path="src/a.ts">
    <metrics statements="18446744073709551615" coveredstatements="0" conditionals="0" coveredconditionals="0" methods="0" coveredmethods="0"/>
  </file>
  <file name="b.ts" path="src/b.ts">
    <metrics statements="1" coveredstatements="0" conditionals="0" coveredconditionals="0" methods="0" coveredmethods="0"/>
  </file>
</package>
</project></coverage>"#;
    let touched = vec![TouchedFile::whole("src/a.ts"), TouchedFile::whole("src/b.ts")];

    let err = ingest_changes(xml, &touched, &IngestOptions::default()).unwrap_err();
    assert!(
        matches!(err, CoverageError::MalformedReport { .. }),
        "{err:?}"
    );
}
