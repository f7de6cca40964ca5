//! Discovery of result files under a build directory.

use std::path::{Path, PathBuf};

use log::debug;
use walkdir::WalkDir;

use crate::model::{has_extension, RESULTS_FOLDER_NAME, RESULT_FILE_EXTENSION};

/// Find every `TestResults` folder under `root` (at any depth, `root`
/// included) and list the result files directly inside each of them.
///
/// A missing root is not an error; it simply has no result files.
pub fn find_result_files(root: &Path) -> Vec<PathBuf> {
    if !root.is_dir() {
        debug!("Result file search root '{}' does not exist", root.display());
        return Vec::new();
    }

    let mut found = Vec::new();
    for dir in find_results_folders(root) {
        debug!("Looking for result files in {}", dir.display());
        found.extend(list_result_files(&dir));
    }
    found
}

fn find_results_folders(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .filter(|e| {
            e.file_name()
                .to_str()
                .map_or(false, |n| n.eq_ignore_ascii_case(RESULTS_FOLDER_NAME))
        })
        .map(|e| e.into_path())
        .collect()
}

fn list_result_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Could not list {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && has_extension(p, RESULT_FILE_EXTENSION))
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"<TestRun/>").unwrap();
    }

    #[test]
    fn test_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_result_files(&dir.path().join("nope")).is_empty());
    }

    #[test]
    fn test_finds_nested_results_folders() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("TestResults/b.trx"));
        touch(&root.join("TestResults/a.TRX"));
        touch(&root.join("src/proj/testresults/c.trx"));
        touch(&root.join("TestResults/notes.txt"));
        // Only files directly inside the results folder count.
        touch(&root.join("TestResults/run/In/deep.trx"));
        // Not inside a results folder.
        touch(&root.join("other/d.trx"));

        let found = find_result_files(root);
        assert_eq!(
            found,
            vec![
                root.join("TestResults/a.TRX"),
                root.join("TestResults/b.trx"),
                root.join("src/proj/testresults/c.trx"),
            ]
        );
    }

    #[test]
    fn test_root_itself_can_be_results_folder() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("TestResults");
        touch(&root.join("run.trx"));
        assert_eq!(find_result_files(&root), vec![root.join("run.trx")]);
    }

    #[test]
    fn test_directory_named_like_result_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("TestResults/folder.trx")).unwrap();
        assert!(find_result_files(root).is_empty());
    }
}
