//! The build environment a processor run works against.

use std::path::PathBuf;

use crate::detect::{self, BuildEnvironment};

/// Property key listing test result files.
pub const TEST_REPORTS_KEY: &str = "sonar.cs.vstest.reportsPaths";

/// Property key listing converted XML coverage reports.
pub const COVERAGE_XML_REPORTS_KEY: &str = "sonar.cs.vscoveragexml.reportsPaths";

/// Report paths the caller already supplied explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportSettings {
    pub test_reports_paths: Option<String>,
    pub coverage_xml_reports_paths: Option<String>,
}

impl ReportSettings {
    pub fn has_test_reports(&self) -> bool {
        is_specified(&self.test_reports_paths)
    }

    pub fn has_coverage_reports(&self) -> bool {
        is_specified(&self.coverage_xml_reports_paths)
    }
}

fn is_specified(value: &Option<String>) -> bool {
    value.as_deref().map_or(false, |v| !v.trim().is_empty())
}

/// Everything a processor run needs to know about the build.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub environment: BuildEnvironment,
    /// Root searched for `TestResults` folders.
    pub build_directory: PathBuf,
    /// Where orphaned coverage files may end up on current CI agents.
    pub agent_temp_directory: Option<PathBuf>,
    pub skip_legacy_code_coverage: bool,
    pub properties_file: PathBuf,
    pub settings: ReportSettings,
}

impl BuildContext {
    /// A local (non-CI) context rooted at `build_directory`.
    pub fn new(build_directory: impl Into<PathBuf>, properties_file: impl Into<PathBuf>) -> Self {
        Self {
            environment: BuildEnvironment::NotTeamBuild,
            build_directory: build_directory.into(),
            agent_temp_directory: None,
            skip_legacy_code_coverage: false,
            properties_file: properties_file.into(),
            settings: ReportSettings::default(),
        }
    }

    /// Build a context from environment variable lookups. The build directory
    /// comes from the agent variables matching the detected environment and
    /// falls back to `default_build_directory`.
    pub fn from_lookup<F>(
        lookup: F,
        default_build_directory: PathBuf,
        properties_file: PathBuf,
        settings: ReportSettings,
    ) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = detect::detect_environment(&lookup);
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let build_directory = match environment {
            BuildEnvironment::TeamBuild => non_empty(detect::CURRENT_BUILD_DIRECTORY),
            BuildEnvironment::LegacyTeamBuild => non_empty(detect::LEGACY_BUILD_DIRECTORY),
            BuildEnvironment::NotTeamBuild => None,
        }
        .map(PathBuf::from)
        .unwrap_or(default_build_directory);

        // Only current agents move attachments into their temp directory.
        let agent_temp_directory = match environment {
            BuildEnvironment::TeamBuild => non_empty(detect::AGENT_TEMP_DIRECTORY).map(PathBuf::from),
            _ => None,
        };

        Self {
            environment,
            build_directory,
            agent_temp_directory,
            skip_legacy_code_coverage: detect::is_truthy(lookup(detect::SKIP_LEGACY_CODE_COVERAGE)),
            properties_file,
            settings,
        }
    }

    /// Same as [`BuildContext::from_lookup`], reading the process environment.
    pub fn from_env(
        default_build_directory: PathBuf,
        properties_file: PathBuf,
        settings: ReportSettings,
    ) -> Self {
        Self::from_lookup(
            |name| std::env::var(name).ok(),
            default_build_directory,
            properties_file,
            settings,
        )
    }
}
