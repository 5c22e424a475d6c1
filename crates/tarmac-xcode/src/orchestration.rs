//! Build orchestration
//!
//! Runs the build half of a release: signing setup, archive, best-effort
//! debug-symbol upload and the optional IPA export. Stages run strictly in
//! order and the first failure stops the build.

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use tarmac_core::config::{Config, ProjectConfig, TimeoutsConfig};
use tarmac_core::{ArtifactTracker, CommandRunner, ReleaseTag, ReleaseType, Result, TarmacError};
use tarmac_signing::{SecretsInstaller, SecretsOutcome};
use tarmac_stores::SymbolUploader;

use crate::export_options::ExportOptions;
use crate::layout::OutputLayout;
use crate::xcodebuild;

const PLACEHOLDER: &str = "mock artifact\n";

/// Where a build is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "stage", rename_all = "snake_case")]
pub enum BuildState {
    Init,
    SecretsConfigured,
    Archived,
    Exported,
    ExportSkipped,
    Done,
    /// Stopped at the named stage
    Failed(&'static str),
}

/// Operator switches for one build
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub install_profile: bool,
    pub install_certificate: bool,
    /// Write placeholder artifacts instead of running the build tools
    pub mock_archive: bool,
    pub export_plist: Option<PathBuf>,
}

/// Result of a completed build
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub state: BuildState,
    pub archive_path: PathBuf,
    pub ipa: Option<PathBuf>,
    pub symbols_uploaded: bool,
    pub secrets: SecretsOutcome,
    pub duration_ms: u64,
}

/// Drives secrets, archive, symbol upload and export for one release type
pub struct BuildOrchestrator<'a> {
    runner: &'a dyn CommandRunner,
    secrets: SecretsInstaller<'a>,
    uploader: Option<&'a dyn SymbolUploader>,
    project: ProjectConfig,
    output_dir: PathBuf,
    timeouts: TimeoutsConfig,
    state: BuildState,
}

impl<'a> BuildOrchestrator<'a> {
    pub fn new(runner: &'a dyn CommandRunner, secrets: SecretsInstaller<'a>, config: &Config) -> Self {
        Self {
            runner,
            secrets,
            uploader: None,
            project: config.project.clone(),
            output_dir: config.output.dir.clone(),
            timeouts: config.timeouts.clone(),
            state: BuildState::Init,
        }
    }

    /// Upload debug symbols through `uploader` after a real build
    pub fn with_uploader(mut self, uploader: Option<&'a dyn SymbolUploader>) -> Self {
        self.uploader = uploader;
        self
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    /// Build `release_type`, recording every produced file in `tracker`
    #[instrument(skip_all, fields(release_type = release_type.id, tag = %tag))]
    pub async fn run(
        &mut self,
        release_type: &ReleaseType,
        tag: &ReleaseTag,
        options: &BuildOptions,
        tracker: &mut ArtifactTracker,
    ) -> Result<BuildOutcome> {
        let start = Instant::now();
        let layout = OutputLayout::new(&self.output_dir, tag.clone(), release_type);

        let secrets = self
            .secrets
            .configure(release_type, options.install_profile, options.install_certificate)
            .await;
        let secrets = self.checkpoint("secrets", secrets, BuildState::SecretsConfigured)?;

        let archived = self.archive(release_type, &layout, options.mock_archive, tracker).await;
        self.checkpoint("archive", archived, BuildState::Archived)?;

        let symbols_uploaded = if options.mock_archive || self.runner.dry_run() {
            debug!("no real archive, skipping debug symbol upload");
            false
        } else {
            self.upload_symbols(&layout).await
        };

        let exported = self.export(release_type, &layout, options, tracker).await;
        let ipa = match exported {
            Ok(Some(ipa)) => {
                self.advance(BuildState::Exported);
                Some(ipa)
            }
            Ok(None) => {
                self.advance(BuildState::ExportSkipped);
                None
            }
            Err(e) => return Err(self.fail("export", e)),
        };
        self.advance(BuildState::Done);

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            artifact_count = tracker.len(),
            exported = ipa.is_some(),
            symbols_uploaded,
            duration_ms,
            dry_run = self.runner.dry_run(),
            "build completed"
        );

        Ok(BuildOutcome {
            state: self.state,
            archive_path: layout.archive_bundle(),
            ipa,
            symbols_uploaded,
            secrets,
            duration_ms,
        })
    }

    fn advance(&mut self, next: BuildState) {
        debug!(from = ?self.state, to = ?next, "build state");
        self.state = next;
    }

    fn fail(&mut self, stage: &'static str, error: TarmacError) -> TarmacError {
        self.advance(BuildState::Failed(stage));
        error.at_stage(stage)
    }

    fn checkpoint<T>(&mut self, stage: &'static str, result: Result<T>, next: BuildState) -> Result<T> {
        match result {
            Ok(value) => {
                self.advance(next);
                Ok(value)
            }
            Err(e) => Err(self.fail(stage, e)),
        }
    }

    #[instrument(skip_all)]
    async fn archive(
        &self,
        release_type: &ReleaseType,
        layout: &OutputLayout,
        mock: bool,
        tracker: &mut ArtifactTracker,
    ) -> Result<()> {
        if !self.runner.dry_run() {
            std::fs::create_dir_all(layout.dir())?;
        }

        let outputs = [
            (layout.archive_zip(), release_type.archive_description()),
            (layout.dsyms_zip(), release_type.dsyms_description()),
            (layout.app_dsym_zip(), release_type.app_dsym_description()),
        ];

        if mock {
            info!("mock archive, writing placeholders");
            for (path, description) in outputs {
                self.write_placeholder(&path)?;
                tracker.record(path, description);
            }
            return Ok(());
        }

        let archive_path = layout.archive_bundle();
        info!(archive = %archive_path.display(), "archiving");
        let archive = xcodebuild::archive(
            &self.project.workspace_path(),
            release_type.scheme,
            release_type.configuration,
            &archive_path,
        );
        self.runner.run_checked(&archive, self.timeouts.archive()).await?;

        let dsyms = archive_path.join("dSYMs");
        let app_dsym = find_app_dsym(&dsyms, release_type.scheme);
        let sources = [archive_path, dsyms, app_dsym];

        for (source, (destination, description)) in sources.iter().zip(outputs) {
            let zip = xcodebuild::zip(source, &destination);
            self.runner.run_checked(&zip, self.timeouts.archive()).await?;
            tracker.record(destination, description);
        }
        Ok(())
    }

    /// Never fails the build
    async fn upload_symbols(&self, layout: &OutputLayout) -> bool {
        let Some(uploader) = self.uploader else {
            debug!("no crash reporting credentials, skipping debug symbol upload");
            return false;
        };

        let files = [layout.dsyms_zip(), layout.app_dsym_zip()];
        match uploader.upload(&files).await {
            Ok(report) => {
                info!(service = uploader.name(), files = report.uploaded.len(), "uploaded debug symbols");
                true
            }
            Err(e) => {
                warn!(service = uploader.name(), error = %e, "debug symbol upload failed");
                false
            }
        }
    }

    #[instrument(skip_all)]
    async fn export(
        &self,
        release_type: &ReleaseType,
        layout: &OutputLayout,
        options: &BuildOptions,
        tracker: &mut ArtifactTracker,
    ) -> Result<Option<PathBuf>> {
        if !release_type.exportable {
            info!("release type is not exportable, skipping export");
            return Ok(None);
        }
        let Some(plist) = options.export_plist.as_deref() else {
            info!("no export options supplied, skipping export");
            return Ok(None);
        };

        let export_options = ExportOptions::load(plist)?;
        let destination = layout.ipa();

        if options.mock_archive {
            self.write_placeholder(&destination)?;
        } else {
            info!(method = export_options.method(), "exporting");
            let export_dir = layout.export_dir();
            let export = xcodebuild::export_archive(&layout.archive_bundle(), export_options.path(), &export_dir);
            self.runner.run_checked(&export, self.timeouts.export()).await?;

            if !self.runner.dry_run() {
                let produced = find_ipa(&export_dir)?;
                debug!(from = %produced.display(), to = %destination.display(), "moving ipa");
                std::fs::rename(&produced, &destination)?;
            }
        }

        tracker.record(&destination, release_type.ipa_description());
        Ok(Some(destination))
    }

    fn write_placeholder(&self, path: &Path) -> Result<()> {
        if self.runner.dry_run() {
            info!(path = %path.display(), "dry run, not writing placeholder");
            return Ok(());
        }
        std::fs::write(path, PLACEHOLDER)?;
        Ok(())
    }
}

/// `*.app.dSYM` inside the archive's dSYMs directory, or the scheme's
/// expected bundle when the archive does not exist yet
fn find_app_dsym(dsyms: &Path, scheme: &str) -> PathBuf {
    bundles_with_suffix(dsyms, ".app.dSYM")
        .into_iter()
        .next()
        .unwrap_or_else(|| dsyms.join(format!("{}.app.dSYM", scheme)))
}

fn find_ipa(export_dir: &Path) -> Result<PathBuf> {
    bundles_with_suffix(export_dir, ".ipa")
        .into_iter()
        .next()
        .ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("export produced no .ipa in {}", export_dir.display()),
            )
            .into()
        })
}

fn bundles_with_suffix(dir: &Path, suffix: &str) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(suffix))
        .map(|e| e.into_path())
        .collect();
    found.sort();
    found
}
