//! Release pipeline
//!
//! Wires every stage of a release together:
//! summary validation, release type lookup, version resolution, the build,
//! extra assets, release notes and publishing. The first failing stage ends
//! the run; only the debug-symbol upload is allowed to fail quietly.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, instrument};

use tarmac_changelog::{ReleaseNoteContext, ReleaseNotePipeline};
use tarmac_core::config::Config;
use tarmac_core::{
    ArtifactTracker, CommandRunner, ReleaseTag, ReleaseType, ReleaseTypeRegistry, Result, VersionInfo,
    VersionResolver,
};
use tarmac_git::{HistorySource, ReleaseBody, ReleasePublisher};
use tarmac_signing::{SecretSource, SecretsInstaller};
use tarmac_stores::SymbolUploader;
use tarmac_xcode::{BuildOptions, BuildOrchestrator, BuildState};

/// Operator input for one run
#[derive(Debug, Clone, Default)]
pub struct ReleaseRequest {
    pub release_type: String,
    /// Publishing happens only when a summary is given
    pub summary: Option<String>,
    pub version: Option<String>,
    pub build: Option<String>,
    /// Release label shown in the notes, e.g. `R9.0`
    pub label: Option<String>,
    pub build_options: BuildOptions,
    pub extra_assets: Vec<(PathBuf, String)>,
    pub github_token: Option<String>,
}

/// What a successful run produced
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub release_type: &'static str,
    pub version: VersionInfo,
    pub tag: ReleaseTag,
    pub state: BuildState,
    pub artifacts: ArtifactTracker,
    pub symbols_uploaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes_truncated: Option<bool>,
    pub published: bool,
    pub dry_run: bool,
}

/// Runs a release against injected collaborators
pub struct ReleasePipeline<'a> {
    config: &'a Config,
    runner: &'a dyn CommandRunner,
    secrets: &'a dyn SecretSource,
    history: &'a dyn HistorySource,
    uploader: Option<&'a dyn SymbolUploader>,
    registry: ReleaseTypeRegistry,
    today: NaiveDate,
}

impl<'a> ReleasePipeline<'a> {
    /// `today` is the run date every tag and file name is rendered from
    pub fn new(
        config: &'a Config,
        runner: &'a dyn CommandRunner,
        secrets: &'a dyn SecretSource,
        history: &'a dyn HistorySource,
        today: NaiveDate,
    ) -> Self {
        Self {
            config,
            runner,
            secrets,
            history,
            uploader: None,
            registry: ReleaseTypeRegistry::builtin(),
            today,
        }
    }

    pub fn with_uploader(mut self, uploader: Option<&'a dyn SymbolUploader>) -> Self {
        self.uploader = uploader;
        self
    }

    #[instrument(skip_all, fields(release_type = %request.release_type, dry_run = self.runner.dry_run()))]
    pub async fn run(&self, request: &ReleaseRequest) -> Result<PipelineReport> {
        let summary = request.summary.as_deref();
        if let Some(summary) = summary {
            ReleasePublisher::validate_summary(summary).map_err(|e| e.at_stage("validate"))?;
        }

        let release_type = self
            .registry
            .resolve(&request.release_type)
            .map_err(|e| e.at_stage("registry"))?;

        let version = self.resolve_version(request).await.map_err(|e| e.at_stage("version"))?;
        let tag = ReleaseTag::new(&version, release_type, self.today);
        info!(tag = %tag, "starting release");

        let mut tracker = ArtifactTracker::new();
        let installer = SecretsInstaller::new(
            self.runner,
            self.secrets,
            &self.config.signing,
            self.config.timeouts.secrets(),
        );
        let build = BuildOrchestrator::new(self.runner, installer, self.config)
            .with_uploader(self.uploader)
            .run(release_type, &tag, &request.build_options, &mut tracker)
            .await?;

        self.record_extra_assets(&request.extra_assets, &mut tracker)
            .map_err(|e| e.at_stage("assets"))?;

        let notes = match summary {
            Some(summary) if release_type.release_notes => Some(
                self.write_notes(release_type, &version, summary, request.label.as_deref(), &mut tracker)
                    .await
                    .map_err(|e| e.at_stage("notes"))?,
            ),
            _ => {
                info!("release notes not requested");
                None
            }
        };

        let published = match summary {
            Some(summary) => {
                let body = match &notes {
                    Some((path, _)) => ReleaseBody::NotesFile(path),
                    None => ReleaseBody::Summary,
                };
                ReleasePublisher::new(self.runner, self.config.timeouts.publish())
                    .with_repository(self.config.github.repository.clone())
                    .with_token(request.github_token.clone())
                    .publish(release_type, &version, self.today, summary, body, &tracker)
                    .await
                    .map_err(|e| e.at_stage("publish"))?;
                true
            }
            None => {
                info!("no release summary, skipping publish");
                false
            }
        };

        Ok(PipelineReport {
            release_type: release_type.id,
            version,
            tag,
            state: build.state,
            artifacts: tracker,
            symbols_uploaded: build.symbols_uploaded,
            notes_truncated: notes.map(|(_, truncated)| truncated),
            published,
            dry_run: self.runner.dry_run(),
        })
    }

    async fn resolve_version(&self, request: &ReleaseRequest) -> Result<VersionInfo> {
        let resolver = VersionResolver::new(
            self.runner,
            &self.config.project.path,
            self.config.timeouts.query(),
        );
        let version = resolver
            .resolve(request.version.as_deref(), request.build.as_deref())
            .await?;
        resolver
            .apply(request.version.as_deref(), request.build.as_deref())
            .await?;
        Ok(version)
    }

    fn record_extra_assets(&self, assets: &[(PathBuf, String)], tracker: &mut ArtifactTracker) -> Result<()> {
        for (path, label) in assets {
            if !self.runner.dry_run() && !path.exists() {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("extra asset {} does not exist", path.display()),
                )
                .into());
            }
            tracker.record(path, label.as_str());
        }
        Ok(())
    }

    /// Returns the short notes path and whether it was truncated
    async fn write_notes(
        &self,
        release_type: &ReleaseType,
        version: &VersionInfo,
        summary: &str,
        label: Option<&str>,
        tracker: &mut ArtifactTracker,
    ) -> Result<(PathBuf, bool)> {
        let pipeline = ReleaseNotePipeline::new(self.config.release_notes.clone(), &self.config.output.dir);
        let ctx = ReleaseNoteContext {
            release_type,
            version,
            date: self.today,
            summary,
            label,
        };
        let notes = pipeline.generate(&ctx, self.history).await?;
        let short = pipeline.write(&notes, tracker)?;
        Ok((short, notes.truncated))
    }
}
