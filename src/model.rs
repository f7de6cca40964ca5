//! Data passed between the pipeline stages: parsed result runs, candidate
//! attachment paths, content fingerprints and conversion outcomes.

use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Extension of result (test run) files.
pub const RESULT_FILE_EXTENSION: &str = "trx";

/// Name of the folder the test runner writes result files into.
pub const RESULTS_FOLDER_NAME: &str = "TestResults";

/// Extension of binary coverage attachments.
pub const COVERAGE_EXTENSION: &str = "coverage";

/// Extension of the converted XML coverage reports.
pub const XML_COVERAGE_EXTENSION: &str = "coveragexml";

/// One parsed result file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRun {
    pub source: PathBuf,
    pub deployment_root: Option<String>,
    pub attachments: Vec<String>,
}

impl ResultRun {
    pub fn new(source: PathBuf) -> Self {
        Self {
            source,
            deployment_root: None,
            attachments: Vec::new(),
        }
    }

    /// Directory containing the result file.
    pub fn results_dir(&self) -> &Path {
        self.source.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Result file name without its extension.
    pub fn base_name(&self) -> String {
        self.source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// A computed location where a coverage attachment might live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageCandidate {
    pub path: PathBuf,
    pub attachment: String,
    pub result_file: PathBuf,
}

/// A file identified by the SHA-256 of its content.
///
/// Equality and hashing only consider the fingerprint: two files with the
/// same bytes are the same coverage payload wherever they live.
#[derive(Debug, Clone)]
pub struct FileWithContentHash {
    pub path: PathBuf,
    pub hash: [u8; 32],
}

impl FileWithContentHash {
    pub fn hex(&self) -> String {
        self.hash.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl PartialEq for FileWithContentHash {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for FileWithContentHash {}

impl Hash for FileWithContentHash {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

/// Outcome of converting one binary coverage file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionResult {
    Success,
    Failure(String),
}

impl ConversionResult {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ConversionResult::Success)
    }
}

/// What a single processor run found and produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessingSummary {
    pub result_files: Vec<PathBuf>,
    pub coverage_files: Vec<PathBuf>,
    pub xml_reports: Vec<PathBuf>,
    pub used_fallback: bool,
    pub skipped: bool,
}

/// Path of the XML report written beside a binary coverage file.
pub fn xml_report_path(coverage_file: &Path) -> PathBuf {
    coverage_file.with_extension(XML_COVERAGE_EXTENSION)
}

/// Case-insensitive extension check.
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}
