//! Turning a raw attachment reference from a result file into a file on disk.
//!
//! The test runner records attachments relative to a per-run folder whose
//! name depends on the tooling that produced it, so several locations are
//! probed in a fixed order:
//!
//!   1. the reference itself, against the results directory (an absolute
//!      reference is used directly)
//!   2. `<resultsDir>/<trxBaseName>/In/<reference>`
//!   3. as 2, with spaces in `trxBaseName` replaced by underscores
//!   4. `<resultsDir>/<deploymentRoot>/In/<reference>`, when the run
//!      recorded a deployment root

use std::path::{Path, PathBuf};

use crate::model::{CoverageCandidate, ResultRun};

const ATTACHMENT_FOLDER: &str = "In";

/// Result of probing the candidate locations for one attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(PathBuf),
    /// Every candidate that was probed, in order, duplicates included.
    NotFound(Vec<CoverageCandidate>),
}

/// Convert a raw reference into a relative (or absolute) path. Both `\` and
/// `/` separate segments, so a `MACHINE\file.coverage` prefix becomes a
/// directory.
pub fn attachment_path(attachment: &str) -> PathBuf {
    let attachment = attachment.trim();
    let mut path = PathBuf::new();
    if attachment.starts_with('/') || attachment.starts_with('\\') {
        path.push(std::path::MAIN_SEPARATOR_STR);
    }
    for segment in attachment.split(['\\', '/']).filter(|s| !s.is_empty()) {
        // A drive letter ("C:") needs its separator to stay rooted on Windows.
        if path.as_os_str().is_empty() && is_drive(segment) {
            path.push(format!("{}{}", segment, std::path::MAIN_SEPARATOR));
        } else {
            path.push(segment);
        }
    }
    path
}

fn is_drive(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Every location where `attachment` of `run` may live, in probing order.
pub fn candidate_paths(run: &ResultRun, attachment: &str) -> Vec<CoverageCandidate> {
    let results_dir = run.results_dir();
    let relative = attachment_path(attachment);
    let base_name = run.base_name();

    let mut paths = vec![
        results_dir.join(&relative),
        in_folder(results_dir, &base_name, &relative),
        in_folder(results_dir, &base_name.replace(' ', "_"), &relative),
    ];
    if let Some(root) = run.deployment_root.as_deref() {
        paths.push(in_folder(results_dir, root, &relative));
    }

    paths
        .into_iter()
        .map(|path| CoverageCandidate {
            path,
            attachment: attachment.to_string(),
            result_file: run.source.clone(),
        })
        .collect()
}

fn in_folder(results_dir: &Path, folder: &str, relative: &Path) -> PathBuf {
    results_dir.join(folder).join(ATTACHMENT_FOLDER).join(relative)
}

/// Probe the candidates of `attachment` in order; the first existing file wins.
pub fn resolve(run: &ResultRun, attachment: &str) -> Resolution {
    let candidates = candidate_paths(run, attachment);
    match candidates.iter().find(|c| c.path.is_file()) {
        Some(found) => Resolution::Found(found.path.clone()),
        None => Resolution::NotFound(candidates),
    }
}

/// Diagnostic for an attachment none of whose candidates exist.
pub fn describe_missing(attachment: &str, result_file: &Path, candidates: &[CoverageCandidate]) -> String {
    let tried: Vec<String> = candidates
        .iter()
        .map(|c| c.path.display().to_string())
        .collect();
    format!(
        "None of the following coverage attachments could be found: {}. Result file: {}. Searched locations: {}",
        attachment,
        result_file.display(),
        tried.join(", ")
    )
}
