//! Release publishing
//!
//! Creates a tagged prerelease through the GitHub CLI with every tracked
//! artifact attached, in recorded order.

use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{info, instrument};

use tarmac_core::error::{Result, ValidationError};
use tarmac_core::{ArtifactTracker, CommandRunner, CommandSpec, ReleaseTag, ReleaseType, VersionInfo};

/// Body of the published release
#[derive(Debug, Clone, Copy)]
pub enum ReleaseBody<'a> {
    /// Markdown file uploaded as the release body
    NotesFile(&'a Path),
    /// Plain summary text, used when no notes were generated
    Summary,
}

/// Publishes tagged prereleases through `gh`
pub struct ReleasePublisher<'a> {
    runner: &'a dyn CommandRunner,
    repository: Option<String>,
    token: Option<String>,
    timeout: Duration,
}

impl<'a> ReleasePublisher<'a> {
    pub fn new(runner: &'a dyn CommandRunner, timeout: Duration) -> Self {
        Self {
            runner,
            repository: None,
            token: None,
            timeout,
        }
    }

    /// Target `owner/name` instead of the repository of the working directory
    pub fn with_repository(mut self, repository: Option<String>) -> Self {
        self.repository = repository;
        self
    }

    /// Token forwarded to `gh` as `GH_TOKEN`
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    /// Reject blank summaries; runs before anything else is computed
    pub fn validate_summary(summary: &str) -> Result<()> {
        if summary.trim().is_empty() {
            return Err(ValidationError::EmptySummary.into());
        }
        Ok(())
    }

    fn command(
        &self,
        tag: &ReleaseTag,
        summary: &str,
        body: ReleaseBody<'_>,
        tracker: &ArtifactTracker,
    ) -> CommandSpec {
        let mut spec = CommandSpec::new("gh")
            .args(["release", "create"])
            .arg(tag.to_string())
            .args(tracker.upload_args())
            .arg("--prerelease")
            .args(["--title".to_string(), format!("Automated Release {}", tag)]);

        spec = match body {
            ReleaseBody::NotesFile(path) => spec.arg("--notes-file").path_arg(path),
            ReleaseBody::Summary => spec.args(["--notes", summary]),
        };
        if let Some(repository) = &self.repository {
            spec = spec.args(["--repo", repository.as_str()]);
        }
        if let Some(token) = &self.token {
            spec = spec.env("GH_TOKEN", token.as_str()).redact(token.as_str());
        }
        spec
    }

    /// Create the release; returns the published tag
    #[instrument(skip_all, fields(release_type = release_type.id))]
    pub async fn publish(
        &self,
        release_type: &ReleaseType,
        version: &VersionInfo,
        date: NaiveDate,
        summary: &str,
        body: ReleaseBody<'_>,
        tracker: &ArtifactTracker,
    ) -> Result<ReleaseTag> {
        Self::validate_summary(summary)?;

        let tag = ReleaseTag::new(version, release_type, date);
        let spec = self.command(&tag, summary, body, tracker);
        self.runner.run_checked(&spec, self.timeout).await?;

        info!(tag = %tag, attachments = tracker.len(), "published release");
        Ok(tag)
    }
}
