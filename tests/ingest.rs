mod common;

use covdelta::config::IngestOptions;
use covdelta::error::CoverageError;
use covdelta::ingest::ingest;
use covdelta::model::{LineCoverageEntry, Ratio};

#[test]
fn ingest_two_file_project() {
    let xml = common::single_package(&[("a.ts", 10, 10), ("b.ts", 10, 0)]);
    let stats = ingest(&xml, &IngestOptions::default()).unwrap();

    assert_eq!(stats.total.lines.fraction(), 0.5);
    assert_eq!(stats.file_count(), 2);
    assert_eq!(stats.file("src", "a.ts").unwrap().metrics.lines.fraction(), 1.0);
    assert_eq!(stats.file("src", "b.ts").unwrap().metrics.lines.fraction(), 0.0);
}

#[test]
fn ingest_fixture_groups_by_folder() {
    let stats = common::current();

    let folders: Vec<_> = stats.folders.keys().cloned().collect();
    assert_eq!(folders, vec!["", "src/api", "src/utils"]);
    assert_eq!(
        common::paths(&stats),
        vec![
            "index.ts",
            "src/api/client.ts",
            "src/utils/math.ts",
            "src/utils/strings.ts"
        ]
    );

    assert_eq!(stats.total.lines, Ratio::new(46, 31));
    assert_eq!(stats.total.methods, Ratio::new(10, 7));
    assert_eq!(stats.total.branches, Ratio::new(8, 5));
    assert_eq!(stats.total.lines.percent(), 67.39);
}

#[test]
fn ingest_fixture_line_and_method_detail() {
    let stats = common::current();
    let math = stats.file("src/utils", "math.ts").unwrap();

    assert_eq!(
        math.lines,
        vec![
            LineCoverageEntry { start: 1, end: 3, covered: true },
            LineCoverageEntry { start: 5, end: 7, covered: false },
            LineCoverageEntry { start: 9, end: 10, covered: true },
        ]
    );
    let methods: Vec<_> = math
        .methods
        .iter()
        .map(|m| (m.name.as_str(), m.covered_percent()))
        .collect();
    assert_eq!(methods, vec![("add", 100), ("divide", 0), ("multiply", 100)]);
}

#[test]
fn ingest_without_workspace_keeps_absolute_folders() {
    let stats = ingest(common::CURRENT_XML, &IngestOptions::default()).unwrap();
    assert!(stats
        .folders
        .contains_key("/home/runner/work/app/app/src/utils"));
    assert!(stats.file("src/utils", "math.ts").is_none());
}

#[test]
fn ingest_is_deterministic() {
    let first = common::current();
    let second = common::current();
    assert_eq!(first, second);
    assert_eq!(common::paths(&first), common::paths(&second));
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn ingest_coalesces_around_uncovered_line() {
    let xml = r#"<coverage clover="3.2.0"><project>
<metrics statements="6" coveredstatements="5" conditionals="0" coveredconditionals="0" methods="0" coveredmethods="0"/>
<file name="a.ts" path="src/a.ts">
  <metrics statements="6" coveredstatements="5" conditionals="0" coveredconditionals="0" methods="0" coveredmethods="0"/>
  <line num="1" count="1" type="stmt"/>
  <line num="2" count="1" type="stmt"/>
  <line num="3" count="1" type="stmt"/>
  <line num="4" count="0" type="stmt"/>
  <line num="5" count="2" type="stmt"/>
  <line num="6" count="2" type="stmt"/>
</file>
</project></coverage>"#;
    let stats = ingest(xml, &IngestOptions::default()).unwrap();
    let entries: Vec<_> = stats.file("src", "a.ts").unwrap()
        .lines
        .iter()
        .map(|e| (e.start, e.end, e.covered_percent()))
        .collect();
    assert_eq!(entries, vec![(1, 3, 100), (4, 4, 0), (5, 6, 100)]);
}

#[test]
fn ingest_malformed_report_names_file() {
    let err = ingest(common::MALFORMED_XML, &common::options()).unwrap_err();
    match err {
        CoverageError::MalformedReport { file, message } => {
            assert_eq!(
                file.as_deref(),
                Some("/home/runner/work/app/app/src/broken.ts")
            );
            assert!(message.contains("missing <metrics> element"));
        }
        other => panic!("expected MalformedReport, got {other:?}"),
    }
}

#[test]
fn ingest_not_xml_is_parse_error() {
    let err = ingest("<coverage><project>", &IngestOptions::default()).unwrap_err();
    assert!(err.is_parse_error(), "{err:?}");

    let err = ingest("", &IngestOptions::default()).unwrap_err();
    assert!(err.is_parse_error(), "{err:?}");
}

#[test]
fn ingest_missing_project_metric_is_malformed() {
    let xml = r#"<coverage><project>
<metrics statements="1" conditionals="0" coveredconditionals="0" methods="0" coveredmethods="0"/>
</project></coverage>"#;
    let err = ingest(xml, &IngestOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        CoverageError::MalformedReport { file: None, .. }
    ));
    assert!(err.to_string().contains("coveredstatements"));
}

#[test]
fn ingest_rejects_text_outside_root() {
    let report = r#"<coverage><project>
<metrics statements="1" coveredstatements="1" conditionals="0" coveredconditionals="0" methods="0" coveredmethods="0"/>
</project></coverage>"#;
    assert!(ingest(report, &IngestOptions::default()).is_ok());

    for xml in [format!("{report}this is not xml"), format!("junk{report}")] {
        let err = ingest(&xml, &IngestOptions::default()).unwrap_err();
        assert!(err.is_parse_error(), "{err:?}");
    }
}
