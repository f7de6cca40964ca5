/// Detection of the CI environment the build runs in.
///
/// Strategy:
///   1. A current-generation build sets `BUILD_BUILDURI`
///   2. A legacy (XAML) build sets `TF_BUILD_BUILDURI`
///   3. Anything else is treated as a local build
use crate::error::TrxcovError;

pub const CURRENT_BUILD_URI: &str = "BUILD_BUILDURI";
pub const LEGACY_BUILD_URI: &str = "TF_BUILD_BUILDURI";
pub const CURRENT_BUILD_DIRECTORY: &str = "AGENT_BUILDDIRECTORY";
pub const LEGACY_BUILD_DIRECTORY: &str = "TF_BUILD_BUILDDIRECTORY";
pub const AGENT_TEMP_DIRECTORY: &str = "AGENT_TEMPDIRECTORY";
pub const SKIP_LEGACY_CODE_COVERAGE: &str = "SQ_SkipLegacyCodeCoverage";
pub const TEST_TOOLS_LOCATION: &str = "VsTestToolsInstallerInstalledToolLocation";

/// Kind of build the pipeline runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildEnvironment {
    NotTeamBuild,
    LegacyTeamBuild,
    TeamBuild,
}

impl BuildEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildEnvironment::NotTeamBuild => "none",
            BuildEnvironment::LegacyTeamBuild => "legacy",
            BuildEnvironment::TeamBuild => "current",
        }
    }
}

impl std::str::FromStr for BuildEnvironment {
    type Err = TrxcovError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "local" => Ok(BuildEnvironment::NotTeamBuild),
            "legacy" => Ok(BuildEnvironment::LegacyTeamBuild),
            "current" => Ok(BuildEnvironment::TeamBuild),
            _ => Err(TrxcovError::UnknownEnvironment(format!(
                "'{}'. Supported: none, legacy, current",
                s
            ))),
        }
    }
}

impl std::fmt::Display for BuildEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify the build from environment variable lookups.
pub fn detect_environment<F>(lookup: F) -> BuildEnvironment
where
    F: Fn(&str) -> Option<String>,
{
    let is_set = |name: &str| lookup(name).map_or(false, |v| !v.trim().is_empty());

    // A current-generation agent may still export the legacy variables for
    // compatibility, so it wins.
    if is_set(CURRENT_BUILD_URI) {
        BuildEnvironment::TeamBuild
    } else if is_set(LEGACY_BUILD_URI) {
        BuildEnvironment::LegacyTeamBuild
    } else {
        BuildEnvironment::NotTeamBuild
    }
}

/// Interpret a boolean-ish environment value ("true", "1", "yes").
pub fn is_truthy(value: Option<String>) -> bool {
    match value {
        Some(v) => matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes"),
        None => false,
    }
}
