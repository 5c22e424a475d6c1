//! Marketing version and build number resolution

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::error::{Result, TarmacError};
use crate::process::{CommandRunner, CommandSpec};

/// Version pair of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub marketing_version: String,
    pub build_number: String,
}

impl VersionInfo {
    pub fn new(marketing_version: impl Into<String>, build_number: impl Into<String>) -> Self {
        Self {
            marketing_version: marketing_version.into(),
            build_number: build_number.into(),
        }
    }

    /// `v<version>_<build - offset>`, the prefix shared by every tag of a build
    pub fn tag_prefix(&self, offset: i64) -> String {
        format!(
            "v{}_{}",
            self.marketing_version,
            previous_build_number(&self.build_number, offset)
        )
    }
}

/// Step a build number back by `offset`.
///
/// Non-numeric build numbers are returned unchanged, so a release built from
/// such a number never finds a previous tag by offset.
pub fn previous_build_number(current: &str, offset: i64) -> String {
    match current.parse::<i64>() {
        Ok(number) => (number - offset).to_string(),
        Err(_) => current.to_string(),
    }
}

/// Resolves versions from operator input or by querying the project
pub struct VersionResolver<'a> {
    runner: &'a dyn CommandRunner,
    project_path: PathBuf,
    timeout: Duration,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

impl<'a> VersionResolver<'a> {
    pub fn new(runner: &'a dyn CommandRunner, project_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            runner,
            project_path: project_path.into(),
            timeout,
        }
    }

    async fn query(&self, args: &[&str]) -> Result<String> {
        let spec = CommandSpec::new("agvtool")
            .args(args.iter().copied())
            .current_dir(&self.project_path)
            .read_only();
        let output = self.runner.run_checked(&spec, self.timeout).await?;
        // The first line is taken verbatim; only an empty line is an error
        match output.first_line() {
            Some(line) if !line.is_empty() => Ok(line.to_string()),
            _ => Err(TarmacError::VersionQuery {
                command: spec.to_string(),
                output: output.stdout,
            }),
        }
    }

    /// Marketing version; a non-empty override wins without querying
    pub async fn marketing_version(&self, override_value: Option<&str>) -> Result<String> {
        if let Some(version) = non_empty(override_value) {
            return Ok(version.to_string());
        }
        self.query(&["what-marketing-version", "-terse1"]).await
    }

    /// Build number; a non-empty override wins without querying
    pub async fn build_number(&self, override_value: Option<&str>) -> Result<String> {
        if let Some(build) = non_empty(override_value) {
            return Ok(build.to_string());
        }
        self.query(&["what-version", "-terse"]).await
    }

    #[instrument(skip(self), fields(project = %self.project_path.display()))]
    pub async fn resolve(
        &self,
        version_override: Option<&str>,
        build_override: Option<&str>,
    ) -> Result<VersionInfo> {
        let info = VersionInfo {
            marketing_version: self.marketing_version(version_override).await?,
            build_number: self.build_number(build_override).await?,
        };
        info!(
            version = %info.marketing_version,
            build = %info.build_number,
            "resolved version"
        );
        Ok(info)
    }

    /// Write explicit overrides back into the project before building
    pub async fn apply(&self, version_override: Option<&str>, build_override: Option<&str>) -> Result<()> {
        if let Some(version) = non_empty(version_override) {
            debug!(version, "setting marketing version");
            let spec = CommandSpec::new("agvtool")
                .args(["new-marketing-version", version])
                .current_dir(&self.project_path);
            self.runner.run_checked(&spec, self.timeout).await?;
        }
        if let Some(build) = non_empty(build_override) {
            debug!(build, "setting build number");
            let spec = CommandSpec::new("agvtool")
                .args(["new-version", "-all", build])
                .current_dir(&self.project_path);
            self.runner.run_checked(&spec, self.timeout).await?;
        }
        Ok(())
    }
}
