#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use trxcov::context::BuildContext;
use trxcov::convert::CoverageConverter;
use trxcov::model::ConversionResult;

/// Write `content` to `path`, creating parent directories.
pub fn write_file(path: &Path, content: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A minimal result file referencing the given coverage attachments.
pub fn trx(attachments: &[&str], deployment_root: Option<&str>) -> String {
    let settings = deployment_root
        .map(|root| {
            format!(
                "<TestSettings name=\"default\"><Deployment runDeploymentRoot=\"{}\" /></TestSettings>",
                root
            )
        })
        .unwrap_or_default();
    let links: String = attachments
        .iter()
        .map(|a| format!("<UriAttachment><A href=\"{}\"></A></UriAttachment>", a))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<TestRun xmlns="http://microsoft.com/schemas/VisualStudio/TeamTest/2010">
  {settings}
  <ResultSummary outcome="Completed">
    <CollectorDataEntries>
      <Collector agentName="M" uri="datacollector://microsoft/CodeCoverage/2.0">
        <UriAttachments>{links}</UriAttachments>
      </Collector>
    </CollectorDataEntries>
  </ResultSummary>
</TestRun>"#
    )
}

/// Build directory with a properties file inside a fresh temp dir.
pub fn setup() -> (tempfile::TempDir, BuildContext) {
    let dir = tempfile::tempdir().unwrap();
    let ctx = BuildContext::new(dir.path().join("build"), dir.path().join("out/sonar-project.properties"));
    fs::create_dir_all(&ctx.build_directory).unwrap();
    (dir, ctx)
}

/// Read the properties file, empty if it was never written.
pub fn read_properties(ctx: &BuildContext) -> String {
    fs::read_to_string(&ctx.properties_file).unwrap_or_default()
}

/// Writes a small XML report and remembers every input it was asked to convert.
#[derive(Clone, Default)]
pub struct FakeConverter {
    pub calls: Rc<RefCell<Vec<PathBuf>>>,
    pub fail: bool,
}

impl CoverageConverter for FakeConverter {
    fn initialize(&self) -> bool {
        true
    }

    fn convert(&self, input: &Path, output: &Path) -> ConversionResult {
        self.calls.borrow_mut().push(input.to_path_buf());
        if self.fail {
            return ConversionResult::Failure("corrupt coverage file".to_string());
        }
        fs::write(output, b"<results><modules/></results>").unwrap();
        ConversionResult::Success
    }
}
