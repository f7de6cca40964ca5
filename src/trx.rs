/// Parser for test result (`.trx`) files.
///
/// Relevant structure (other elements are ignored):
///   <TestRun xmlns="http://microsoft.com/schemas/VisualStudio/TeamTest/2010">
///     <TestSettings>
///       <Deployment runDeploymentRoot="user_MACHINE 2024-01-01 10_00_00" />
///     </TestSettings>
///     <ResultSummary>
///       <CollectorDataEntries>
///         <Collector uri="datacollector://microsoft/CodeCoverage/2.0">
///           <UriAttachments>
///             <UriAttachment><A href="MACHINE\run.coverage" /></UriAttachment>
///           </UriAttachments>
///         </Collector>
///       </CollectorDataEntries>
///     </ResultSummary>
///   </TestRun>
///
/// Elements are matched on local names so both the 2006 and 2010 schema
/// namespaces, with or without a prefix, are understood.
use std::collections::HashMap;
use std::path::Path;
use std::str;

use log::{info, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{Result, TrxcovError};
use crate::model::ResultRun;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Marker in a collector `uri` identifying the code coverage data collector.
const COVERAGE_COLLECTOR_MARKER: &str = "codecoverage";

/// Ancestors of an `<A href>` attachment element inside a collector.
const ATTACHMENT_PARENTS: &[&[u8]] = &[b"UriAttachments", b"UriAttachment"];

/// Parse result file content. `source` is recorded on the returned run.
pub fn parse_trx(input: &[u8], source: &Path) -> Result<ResultRun> {
    let input = input.strip_prefix(UTF8_BOM).unwrap_or(input);
    let mut reader = Reader::from_reader(input);
    reader.trim_text(true);

    let mut run = ResultRun::new(source.to_path_buf());
    let mut buf = Vec::new();

    // Local names of the currently open elements.
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut seen_root = false;
    let mut in_coverage_collector = false;

    loop {
        let event = reader.read_event_into(&mut buf);
        let is_start_event = matches!(&event, Ok(Event::Start(_)));
        match event {
            Err(e) => {
                return Err(TrxcovError::Xml {
                    source: e,
                    position: reader.buffer_position(),
                })
            }
            Ok(Event::Eof) => break,
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                if stack.is_empty() && seen_root {
                    return Err(TrxcovError::Other(
                        "more than one root element".to_string(),
                    ));
                }
                seen_root = true;

                let local = e.local_name().as_ref().to_vec();
                match local.as_slice() {
                    b"Collector" if parent_is(&stack, b"CollectorDataEntries") => {
                        // An empty <Collector/> carries no attachments.
                        if is_start_event {
                            in_coverage_collector = attr_map(e)
                                .get("uri")
                                .map(|uri| is_coverage_collector(uri.as_str()))
                                .unwrap_or(false);
                        }
                    }
                    b"A" if in_coverage_collector
                        && ends_with(&stack, ATTACHMENT_PARENTS) =>
                    {
                        if let Some(href) = attr_map(e).remove("href") {
                            if !href.trim().is_empty() {
                                run.attachments.push(href);
                            }
                        }
                    }
                    b"Deployment" if parent_is(&stack, b"TestSettings") => {
                        if let Some(root) = attr_map(e).remove("runDeploymentRoot") {
                            if !root.trim().is_empty() {
                                run.deployment_root = Some(root);
                            }
                        }
                    }
                    _ => {}
                }

                if is_start_event {
                    stack.push(local);
                }
            }
            Ok(Event::End(ref e)) => {
                if e.local_name().as_ref() == b"Collector" {
                    in_coverage_collector = false;
                }
                stack.pop();
            }
            _ => {}
        }
        buf.clear();
    }

    if !seen_root {
        return Err(TrxcovError::Other("no root element".to_string()));
    }
    if let Some(open) = stack.last() {
        return Err(TrxcovError::Other(format!(
            "unexpected end of document inside <{}>",
            String::from_utf8_lossy(open)
        )));
    }

    if run.attachments.len() > 1 {
        info!(
            "Result file {} references {} coverage attachments; the run was probably collected by several agents",
            source.display(),
            run.attachments.len()
        );
    }

    Ok(run)
}

/// Read and parse a result file. Any failure is reported as `InvalidFormat`.
pub fn parse_result_file(path: &Path) -> Result<ResultRun> {
    let invalid = |message: String| TrxcovError::InvalidFormat {
        path: path.display().to_string(),
        message,
    };
    let content = std::fs::read(path).map_err(|e| invalid(e.to_string()))?;
    parse_trx(&content, path).map_err(|e| invalid(e.to_string()))
}

/// Parse a result file, treating a failure as a run without attachments.
pub fn load_result_run(path: &Path) -> ResultRun {
    match parse_result_file(path) {
        Ok(run) => run,
        Err(e) => {
            warn!("{}", e);
            ResultRun::new(path.to_path_buf())
        }
    }
}

fn is_coverage_collector(uri: &str) -> bool {
    uri.to_ascii_lowercase().contains(COVERAGE_COLLECTOR_MARKER)
}

fn parent_is(stack: &[Vec<u8>], name: &[u8]) -> bool {
    stack.last().map_or(false, |p| p.as_slice() == name)
}

fn ends_with(stack: &[Vec<u8>], names: &[&[u8]]) -> bool {
    stack.len() >= names.len()
        && stack[stack.len() - names.len()..]
            .iter()
            .zip(names)
            .all(|(a, b)| a.as_slice() == *b)
}

/// Extract attributes from an XML element into a HashMap.
fn attr_map(e: &BytesStart) -> HashMap<String, String> {
    e.attributes()
        .filter_map(|a| {
            let attr = a.ok()?;
            let key = str::from_utf8(attr.key.local_name().into_inner())
                .ok()?
                .to_string();
            let value = attr.unescape_value().ok()?.to_string();
            Some((key, value))
        })
        .collect()
}
