mod common;

use std::path::Path;

use trxcov::error::TrxcovError;
use trxcov::trx::{load_result_run, parse_result_file, parse_trx};

#[test]
fn parses_single_attachment_and_deployment_root() {
    let input = include_bytes!("fixtures/single_attachment.trx");
    let run = parse_trx(input, Path::new("single_attachment.trx")).unwrap();

    assert_eq!(
        run.attachments,
        vec!["BUILDBOX\\builder_BUILDBOX_2024-05-14.09_12_41.coverage".to_string()]
    );
    assert_eq!(
        run.deployment_root.as_deref(),
        Some("builder_BUILDBOX 2024-05-14 09_12_44")
    );
}

#[test]
fn keeps_every_attachment_of_a_multi_agent_run() {
    let input = include_bytes!("fixtures/multiple_attachments.trx");
    let run = parse_trx(input, Path::new("multiple_attachments.trx")).unwrap();

    assert_eq!(
        run.attachments,
        vec![
            "AGENT1\\first.coverage".to_string(),
            "AGENT2\\second.coverage".to_string()
        ]
    );
    assert_eq!(run.deployment_root, None);
}

#[test]
fn unknown_elements_are_ignored() {
    let input = include_bytes!("fixtures/no_attachments.trx");
    let run = parse_trx(input, Path::new("no_attachments.trx")).unwrap();
    assert!(run.attachments.is_empty());
}

#[test]
fn parses_older_schema() {
    let input = include_bytes!("fixtures/legacy_2006.trx");
    let run = parse_trx(input, Path::new("legacy_2006.trx")).unwrap();

    assert_eq!(run.attachments, vec!["OLDBOX\\data.coverage".to_string()]);
    assert_eq!(
        run.deployment_root.as_deref(),
        Some("builder_OLDBOX 2012-01-02 03_04_05")
    );
}

#[test]
fn non_xml_file_is_invalid_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("aborted.trx");
    common::write_file(&path, include_bytes!("fixtures/not_xml.trx"));

    match parse_result_file(&path) {
        Err(TrxcovError::InvalidFormat { path: reported, message }) => {
            assert!(reported.ends_with("aborted.trx"));
            assert!(!message.is_empty());
        }
        other => panic!("expected InvalidFormat, got {:?}", other),
    }
}

#[test]
fn tolerant_load_yields_empty_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.trx");
    common::write_file(&path, b"<TestRun><ResultSummary></TestRun>");

    let run = load_result_run(&path);
    assert_eq!(run.source, path);
    assert!(run.attachments.is_empty());
}

#[test]
fn missing_file_is_invalid_format() {
    let dir = tempfile::tempdir().unwrap();
    let result = parse_result_file(&dir.path().join("gone.trx"));
    assert!(matches!(result, Err(TrxcovError::InvalidFormat { .. })));
}
