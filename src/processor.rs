//! Drives one coverage run: find result files, resolve their coverage
//! attachments (or recover orphaned ones), convert them to XML and record
//! the outcome in the properties file.

use std::path::PathBuf;

use log::{debug, info, warn};

use crate::context::{BuildContext, COVERAGE_XML_REPORTS_KEY, TEST_REPORTS_KEY};
use crate::convert::{convert_to_xml, CoverageConverter};
use crate::detect::BuildEnvironment;
use crate::error::{Result, TrxcovError};
use crate::fallback::find_fallback_coverage_files;
use crate::hash::dedupe_in_order;
use crate::locate::find_result_files;
use crate::model::{xml_report_path, ProcessingSummary};
use crate::properties::append_properties;
use crate::resolve::{describe_missing, resolve, Resolution};
use crate::trx::load_result_run;

enum State {
    Uninitialized,
    Initialized {
        context: BuildContext,
        can_convert: bool,
    },
    Processed,
}

pub struct ReportProcessor {
    converter: Box<dyn CoverageConverter>,
    state: State,
    summary: ProcessingSummary,
}

impl ReportProcessor {
    pub fn new(converter: Box<dyn CoverageConverter>) -> Self {
        Self {
            converter,
            state: State::Uninitialized,
            summary: ProcessingSummary::default(),
        }
    }

    /// Bind the processor to a build. Returns whether binary coverage can be
    /// converted; result files are reported either way.
    pub fn initialize(&mut self, context: BuildContext) -> Result<bool> {
        if !matches!(self.state, State::Uninitialized) {
            return Err(TrxcovError::AlreadyInitialized);
        }
        debug!(
            "Initializing coverage processing for a '{}' build in {}",
            context.environment,
            context.build_directory.display()
        );
        let can_convert = self.converter.initialize();
        self.state = State::Initialized {
            context,
            can_convert,
        };
        Ok(can_convert)
    }

    /// Run the pipeline. Only a missing [`ReportProcessor::initialize`] call
    /// is an error; every data problem is logged and processing continues.
    pub fn process_coverage_reports(&mut self) -> Result<bool> {
        let (context, can_convert) = match std::mem::replace(&mut self.state, State::Processed) {
            State::Uninitialized => {
                self.state = State::Uninitialized;
                return Err(TrxcovError::NotInitialized);
            }
            State::Processed => {
                debug!("Coverage reports have already been processed");
                return Ok(true);
            }
            State::Initialized {
                context,
                can_convert,
            } => (context, can_convert),
        };

        self.summary = run(self.converter.as_ref(), &context, can_convert);
        Ok(true)
    }

    /// Outcome of the last completed run.
    pub fn summary(&self) -> &ProcessingSummary {
        &self.summary
    }
}

fn run(converter: &dyn CoverageConverter, context: &BuildContext, can_convert: bool) -> ProcessingSummary {
    let mut summary = ProcessingSummary::default();

    if context.environment == BuildEnvironment::LegacyTeamBuild && context.skip_legacy_code_coverage {
        info!("Skipping coverage processing for the legacy build as requested");
        summary.skipped = true;
        return summary;
    }

    let settings = &context.settings;
    if settings.has_test_reports() && settings.has_coverage_reports() {
        info!("Test and coverage report paths were supplied explicitly, nothing to do");
        summary.skipped = true;
        return summary;
    }

    summary.result_files = find_result_files(&context.build_directory);
    if summary.result_files.is_empty() {
        info!(
            "No test result files found under {}",
            context.build_directory.display()
        );
    }

    if settings.has_coverage_reports() {
        info!("Coverage report paths were supplied explicitly, not searching for coverage files");
    } else {
        summary.coverage_files = resolve_attachments(&summary.result_files);

        if summary.coverage_files.is_empty() && context.agent_temp_directory.is_some() {
            info!("Did not find any binary coverage files in the expected location");
            summary.coverage_files =
                find_fallback_coverage_files(context.agent_temp_directory.as_deref());
            summary.used_fallback = true;
        }

        if summary.coverage_files.is_empty() {
            info!("No coverage files found");
        }
        summary.xml_reports = convert_all(converter, &summary.coverage_files, can_convert);
    }

    let test_reports = if settings.has_test_reports() {
        Vec::new()
    } else {
        summary.result_files.clone()
    };
    let coverage_reports = if settings.has_coverage_reports() {
        Vec::new()
    } else {
        summary.xml_reports.clone()
    };
    if let Err(e) = append_properties(
        &context.properties_file,
        &[
            (TEST_REPORTS_KEY, test_reports),
            (COVERAGE_XML_REPORTS_KEY, coverage_reports),
        ],
    ) {
        warn!(
            "Could not write report paths to {}: {}",
            context.properties_file.display(),
            e
        );
    }

    summary
}

/// Resolve every attachment of every result file, in order. Of several files
/// with the same content only the first one resolved is kept.
fn resolve_attachments(result_files: &[PathBuf]) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = Vec::new();
    for file in result_files {
        let run = load_result_run(file);
        for attachment in &run.attachments {
            match resolve(&run, attachment) {
                Resolution::Found(path) => {
                    debug!("Resolved coverage attachment {} to {}", attachment, path.display());
                    found.push(path);
                }
                Resolution::NotFound(candidates) => {
                    warn!("{}", describe_missing(attachment, &run.source, &candidates));
                }
            }
        }
    }
    dedupe_in_order(&found)
}

/// Produce an XML report for each binary file, reusing existing ones.
fn convert_all(converter: &dyn CoverageConverter, coverage_files: &[PathBuf], can_convert: bool) -> Vec<PathBuf> {
    let mut reports = Vec::new();
    for input in coverage_files {
        let output = xml_report_path(input);
        if output.exists() {
            debug!("XML report {} already exists, not converting", output.display());
            reports.push(output);
            continue;
        }
        if !can_convert {
            continue;
        }
        match convert_to_xml(converter, input, &output) {
            Ok(true) => reports.push(output),
            Ok(false) => {}
            // Paths built here are never empty.
            Err(e) => warn!("Failed to convert {}: {}", input.display(), e),
        }
    }
    reports
}
