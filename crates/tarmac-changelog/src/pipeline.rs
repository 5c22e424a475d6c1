//! Release note generation and persistence

use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use tarmac_core::config::ReleaseNotesConfig;
use tarmac_core::{ArtifactTracker, Result};
use tarmac_git::HistorySource;

use crate::release_notes::{ReleaseNoteContext, ReleaseNotes, ReleaseNotesGenerator};

/// File name of the size-capped notes
pub const SHORT_NOTES_FILE: &str = "release-notes.md";

/// File name of the complete notes
pub const FULL_NOTES_FILE: &str = "full-release-notes.md";

/// Generates release notes and writes both documents to the output directory
pub struct ReleaseNotePipeline {
    generator: ReleaseNotesGenerator,
    output_dir: PathBuf,
}

impl ReleaseNotePipeline {
    pub fn new(config: ReleaseNotesConfig, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            generator: ReleaseNotesGenerator::new(config),
            output_dir: output_dir.into(),
        }
    }

    pub fn short_path(&self) -> PathBuf {
        self.output_dir.join(SHORT_NOTES_FILE)
    }

    pub fn full_path(&self) -> PathBuf {
        self.output_dir.join(FULL_NOTES_FILE)
    }

    pub async fn generate(
        &self,
        ctx: &ReleaseNoteContext<'_>,
        history: &dyn HistorySource,
    ) -> Result<ReleaseNotes> {
        self.generator.generate(ctx, history).await
    }

    /// Persist both documents and record them, short first; returns the
    /// path of the short document
    #[instrument(skip_all, fields(output_dir = %self.output_dir.display()))]
    pub fn write(&self, notes: &ReleaseNotes, tracker: &mut ArtifactTracker) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;

        let short = self.short_path();
        let full = self.full_path();
        write_file(&short, &notes.short)?;
        write_file(&full, &notes.full)?;

        tracker.record(&short, "Release Notes");
        tracker.record(&full, "Full Release Notes");
        info!(
            short = %short.display(),
            full = %full.display(),
            truncated = notes.truncated,
            "wrote release notes"
        );
        Ok(short)
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)?;
    Ok(())
}
