//! Command handler functions for the trxcov CLI.
//!
//! Each `cmd_*` function returns its output as a `String`, making them easy
//! to test without capturing stdout.

use std::fmt::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::context::BuildContext;
use crate::convert::{convert_to_xml, CoverageConverter};
use crate::locate::find_result_files;
use crate::model::xml_report_path;
use crate::processor::ReportProcessor;
use crate::resolve::{resolve, Resolution};
use crate::trx::parse_result_file;

/// Run the whole pipeline for `context`.
pub fn cmd_process(
    converter: Box<dyn CoverageConverter>,
    context: BuildContext,
    json: bool,
) -> Result<String> {
    let properties_file = context.properties_file.clone();
    let mut processor = ReportProcessor::new(converter);
    processor.initialize(context)?;
    processor.process_coverage_reports()?;
    let summary = processor.summary();

    if json {
        let mut out = serde_json::to_string_pretty(summary).context("Failed to serialize summary")?;
        out.push('\n');
        return Ok(out);
    }

    let mut out = String::new();
    if summary.skipped {
        writeln!(out, "Coverage processing skipped.").unwrap();
        return Ok(out);
    }
    writeln!(out, "Result files:    {}", summary.result_files.len()).unwrap();
    writeln!(out, "Coverage files:  {}", summary.coverage_files.len()).unwrap();
    writeln!(out, "XML reports:     {}", summary.xml_reports.len()).unwrap();
    if summary.used_fallback {
        writeln!(out, "Fallback search: used").unwrap();
    }
    writeln!(out, "Properties:      {}", properties_file.display()).unwrap();
    Ok(out)
}

/// List result files under `root` with each attachment and where it resolves.
pub fn cmd_find(root: &Path) -> Result<String> {
    let files = find_result_files(root);
    if files.is_empty() {
        return Ok(format!("No result files found under {}\n", root.display()));
    }

    let mut out = String::new();
    for file in &files {
        writeln!(out, "{}", file.display()).unwrap();
        let run = match parse_result_file(file) {
            Ok(run) => run,
            Err(e) => {
                writeln!(out, "  ! {}", e).unwrap();
                continue;
            }
        };
        if run.attachments.is_empty() {
            writeln!(out, "  (no coverage attachments)").unwrap();
        }
        for attachment in &run.attachments {
            match resolve(&run, attachment) {
                Resolution::Found(path) => {
                    writeln!(out, "  {} -> {}", attachment, path.display()).unwrap()
                }
                Resolution::NotFound(candidates) => {
                    writeln!(out, "  {} -> not found", attachment).unwrap();
                    for c in &candidates {
                        writeln!(out, "      tried {}", c.path.display()).unwrap();
                    }
                }
            }
        }
    }
    Ok(out)
}

/// Convert a single binary coverage file.
pub fn cmd_convert(
    converter: &dyn CoverageConverter,
    input: &Path,
    output: Option<&Path>,
) -> Result<String> {
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| xml_report_path(input));
    if !converter.initialize() {
        anyhow::bail!("No coverage conversion tool available");
    }
    if convert_to_xml(converter, input, &output)? {
        Ok(format!("Converted {} -> {}\n", input.display(), output.display()))
    } else {
        anyhow::bail!("Failed to convert {}", input.display())
    }
}
