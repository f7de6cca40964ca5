mod common;

use trxcov::fallback::find_fallback_coverage_files;
use trxcov::hash::dedupe;

#[test]
fn identical_files_in_different_folders_collapse() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("one/dup1.coverage");
    let b = dir.path().join("two/deeper/dup2.coverage");
    common::write_file(&a, b"same coverage payload");
    common::write_file(&b, b"same coverage payload");

    let found = find_fallback_coverage_files(Some(dir.path()));
    assert_eq!(found.len(), 1);
    assert!(found[0] == a || found[0] == b);
}

#[test]
fn same_name_different_content_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    common::write_file(&dir.path().join("x/run.coverage"), b"first");
    common::write_file(&dir.path().join("y/run.coverage"), b"second");

    assert_eq!(find_fallback_coverage_files(Some(dir.path())).len(), 2);
}

#[test]
fn dedupe_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let files: Vec<_> = [("a", "1"), ("b", "1"), ("c", "2"), ("d/e", "3"), ("f", "2")]
        .iter()
        .map(|(name, content)| {
            let path = dir.path().join(format!("{}.coverage", name));
            common::write_file(&path, content.as_bytes());
            path
        })
        .collect();

    let once = dedupe(&files);
    assert_eq!(once.len(), 3);
    assert_eq!(dedupe(&once), once);
}

#[cfg(target_os = "linux")]
#[test]
fn case_variants_are_distinct_files_on_case_sensitive_systems() {
    let dir = tempfile::tempdir().unwrap();
    common::write_file(&dir.path().join("BAR.COVERAGE"), b"upper");
    common::write_file(&dir.path().join("bar.coverage"), b"lower");

    assert_eq!(find_fallback_coverage_files(Some(dir.path())).len(), 2);

    // Same bytes collapse regardless of casing.
    common::write_file(&dir.path().join("bar.coverage"), b"upper");
    assert_eq!(find_fallback_coverage_files(Some(dir.path())).len(), 1);
}
