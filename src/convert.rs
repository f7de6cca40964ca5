//! Conversion of binary `.coverage` files to XML.
//!
//! The binary format is opaque; an external tool (`CodeCoverage.exe analyze`
//! by default) does the actual work. The tool formats numbers according to
//! its locale, so every conversion runs with the invariant culture pinned.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{debug, warn};

use crate::culture::{Culture, CultureScope};
use crate::detect::TEST_TOOLS_LOCATION;
use crate::error::{Result, TrxcovError};
use crate::model::ConversionResult;

/// Default argument template; `{input}` and `{output}` are substituted.
pub const DEFAULT_ARGS: &[&str] = &["analyze", "/output:{output}", "{input}"];

/// Executable names searched on `PATH`.
const TOOL_NAMES: &[&str] = &["CodeCoverage", "CodeCoverage.exe"];

/// Location of the tool inside a test platform installed by the CI agent.
const TOOLS_INSTALLER_RELATIVE_PATH: &str =
    "tools/net451/Team Tools/Dynamic Code Coverage Tools/CodeCoverage.exe";

/// Something that turns one binary coverage file into one XML report.
pub trait CoverageConverter {
    /// Whether the converter can run at all on this machine.
    fn initialize(&self) -> bool;

    /// Convert `input` into `output`. `output` must only be written on success.
    fn convert(&self, input: &Path, output: &Path) -> ConversionResult;
}

/// Runs an external conversion tool in a child process.
#[derive(Debug, Clone)]
pub struct ExternalToolConverter {
    program: PathBuf,
    args: Vec<String>,
    /// Directories searched for a bare program name, in `PATH` syntax.
    search_path: Option<String>,
}

impl ExternalToolConverter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: DEFAULT_ARGS.iter().map(|a| a.to_string()).collect(),
            search_path: None,
        }
    }

    /// Directories to look in when the program is a bare name.
    pub fn with_search_path(mut self, search_path: impl Into<String>) -> Self {
        self.search_path = Some(search_path.into());
        self
    }

    /// Replace the argument template.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Pick the conversion tool: an explicit path wins, then the agent's test
    /// platform installation, then whatever is on `PATH`.
    pub fn discover<F>(explicit: Option<PathBuf>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let search_path = lookup("PATH");
        let with_path = |converter: Self| match &search_path {
            Some(path) => converter.with_search_path(path.clone()),
            None => converter,
        };

        if let Some(program) = explicit {
            return with_path(Self::new(program));
        }
        if let Some(location) = lookup(TEST_TOOLS_LOCATION).filter(|l| !l.trim().is_empty()) {
            let candidate = Path::new(&location).join(TOOLS_INSTALLER_RELATIVE_PATH);
            if candidate.is_file() {
                return with_path(Self::new(candidate));
            }
            debug!(
                "No conversion tool at {}, looking on PATH",
                candidate.display()
            );
        }
        let on_path = search_path.as_deref().and_then(|path| {
            TOOL_NAMES
                .iter()
                .find_map(|name| find_on_path(path, Path::new(name)))
        });
        with_path(Self::new(on_path.unwrap_or_else(|| PathBuf::from(TOOL_NAMES[0]))))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// The program as it will be spawned, if it can be found.
    fn resolve_program(&self) -> Option<PathBuf> {
        if self.program.components().count() > 1 || self.program.is_absolute() {
            return self.program.is_file().then(|| self.program.clone());
        }
        let path = self.search_path.as_deref()?;
        find_on_path(path, &self.program)
    }

    fn command(&self, input: &Path, output: &Path) -> Command {
        let input = input.display().to_string();
        let output = output.display().to_string();
        let program = self.resolve_program().unwrap_or_else(|| self.program.clone());
        let mut cmd = Command::new(program);
        for arg in &self.args {
            cmd.arg(arg.replace("{input}", &input).replace("{output}", &output));
        }

        let culture = Culture::current();
        let locale = culture.posix_locale();
        cmd.env("LC_ALL", &locale).env("LANG", &locale);
        if culture.is_invariant() {
            cmd.env("DOTNET_SYSTEM_GLOBALIZATION_INVARIANT", "1");
        } else {
            cmd.env_remove("DOTNET_SYSTEM_GLOBALIZATION_INVARIANT");
        }
        cmd.stdin(Stdio::null());
        cmd
    }
}

impl CoverageConverter for ExternalToolConverter {
    fn initialize(&self) -> bool {
        match self.resolve_program() {
            Some(program) => {
                debug!("Using coverage conversion tool {}", program.display());
                true
            }
            None => {
                warn!(
                    "Could not find the coverage conversion tool '{}'; binary coverage files will not be converted",
                    self.program.display()
                );
                false
            }
        }
    }

    fn convert(&self, input: &Path, output: &Path) -> ConversionResult {
        let dir = match output.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        // The tool writes next to the final location and the result is only
        // moved into place once it succeeded.
        let staging = match tempfile::Builder::new()
            .prefix(".trxcov-")
            .suffix(".coveragexml")
            .tempfile_in(dir)
        {
            Ok(file) => file.into_temp_path(),
            Err(e) => {
                return ConversionResult::Failure(format!(
                    "cannot create a temporary file in {}: {}",
                    dir.display(),
                    e
                ))
            }
        };

        debug!(
            "Running {} for {}",
            self.program.display(),
            input.display()
        );
        let out = match self.command(input, &staging).output() {
            Ok(out) => out,
            Err(e) => {
                return ConversionResult::Failure(format!(
                    "failed to run {}: {}",
                    self.program.display(),
                    e
                ))
            }
        };
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            let stdout = String::from_utf8_lossy(&out.stdout);
            let detail = if stderr.trim().is_empty() { stdout } else { stderr };
            return ConversionResult::Failure(format!(
                "{} exited with {}: {}",
                self.program.display(),
                out.status,
                detail.trim()
            ));
        }

        match std::fs::metadata(&staging) {
            Ok(meta) if meta.len() > 0 => {}
            _ => {
                return ConversionResult::Failure(format!(
                    "{} did not produce any output",
                    self.program.display()
                ))
            }
        }

        match staging.persist(output) {
            Ok(()) => ConversionResult::Success,
            Err(e) => ConversionResult::Failure(format!(
                "cannot write {}: {}",
                output.display(),
                e.error
            )),
        }
    }
}

fn find_on_path(path: &str, program: &Path) -> Option<PathBuf> {
    std::env::split_paths(path)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

fn is_blank(path: &Path) -> bool {
    path.as_os_str().to_string_lossy().trim().is_empty()
}

/// Open the file and read a byte, the way the converter will.
fn probe_readable(path: &Path) -> std::io::Result<()> {
    let mut file = File::open(path)?;
    let mut byte = [0u8; 1];
    file.read(&mut byte).map(|_| ())
}

/// Convert one binary coverage file, reporting any failure as a warning.
///
/// Empty arguments are a caller bug and the only case that returns an error;
/// everything else yields `Ok(true)` on success and `Ok(false)` otherwise.
pub fn convert_to_xml(
    converter: &dyn CoverageConverter,
    input: &Path,
    output: &Path,
) -> Result<bool> {
    if is_blank(input) {
        return Err(TrxcovError::EmptyArgument("input"));
    }
    if is_blank(output) {
        return Err(TrxcovError::EmptyArgument("output"));
    }

    if !input.exists() {
        warn!(
            "Failed to convert {}: the file does not exist",
            input.display()
        );
        return Ok(false);
    }
    if let Err(e) = probe_readable(input) {
        warn!(
            "Failed to convert {}: the file is locked or cannot be read ({})",
            input.display(),
            e
        );
        return Ok(false);
    }

    let result = {
        let _culture = CultureScope::enter(Culture::invariant());
        converter.convert(input, output)
    };

    match result {
        ConversionResult::Success => {
            debug!("Converted {} -> {}", input.display(), output.display());
            Ok(true)
        }
        ConversionResult::Failure(message) => {
            warn!("Failed to convert {}: {}", input.display(), message);
            Ok(false)
        }
    }
}
