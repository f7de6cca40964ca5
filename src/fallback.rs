//! Last-resort recovery of coverage files some agents write to their temp
//! directory without linking them from any result file.

use std::path::{Path, PathBuf};

use log::{debug, info};
use walkdir::WalkDir;

use crate::hash;
use crate::model::{has_extension, COVERAGE_EXTENSION};

/// All distinct (by content) coverage files under `agent_temp_dir`.
pub fn find_fallback_coverage_files(agent_temp_dir: Option<&Path>) -> Vec<PathBuf> {
    let dir = match agent_temp_dir {
        Some(dir) if dir.is_dir() => dir,
        Some(dir) => {
            info!(
                "Agent temp directory '{}' does not exist, skipping the coverage fallback search",
                dir.display()
            );
            return Vec::new();
        }
        None => {
            info!("No agent temp directory is set, skipping the coverage fallback search");
            return Vec::new();
        }
    };

    info!("Searching for coverage files in {}", dir.display());
    let files: Vec<PathBuf> = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && has_extension(e.path(), COVERAGE_EXTENSION))
        .map(|e| e.into_path())
        .collect();
    debug!("Found {} candidate coverage files", files.len());

    let unique = hash::dedupe(&files);
    info!(
        "Found {} distinct coverage files in {}",
        unique.len(),
        dir.display()
    );
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_no_directory() {
        assert!(find_fallback_coverage_files(None).is_empty());
        let dir = tempfile::tempdir().unwrap();
        assert!(find_fallback_coverage_files(Some(&dir.path().join("missing"))).is_empty());
    }

    #[test]
    fn test_only_coverage_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("x/y")).unwrap();
        fs::write(dir.path().join("x/y/a.coverage"), b"a").unwrap();
        fs::write(dir.path().join("x/b.Coverage"), b"b").unwrap();
        fs::write(dir.path().join("c.coveragexml"), b"c").unwrap();
        fs::write(dir.path().join("d.trx"), b"d").unwrap();

        let mut found = find_fallback_coverage_files(Some(dir.path()));
        found.sort();
        assert_eq!(
            found,
            vec![dir.path().join("x/b.Coverage"), dir.path().join("x/y/a.coverage")]
        );
    }
}
