//! Provisioning profile installation

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};
use walkdir::WalkDir;

use tarmac_core::error::{Result, SecretsError};

const PROFILE_EXTENSION: &str = "mobileprovision";

/// Copies provisioning profiles into the directory Xcode reads them from
#[derive(Debug, Clone)]
pub struct ProfileInstaller {
    destination: PathBuf,
}

impl ProfileInstaller {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
        }
    }

    /// Installer targeting `~/Library/MobileDevice/Provisioning Profiles`
    pub fn for_current_user() -> Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| {
            SecretsError::ProfileStoreUnavailable("home directory not found".to_string())
        })?;
        Ok(Self::new(
            home.join("Library/MobileDevice/Provisioning Profiles"),
        ))
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Profiles directly inside `source`, sorted by name
    pub fn find_profiles(source: &Path) -> Vec<PathBuf> {
        let mut profiles: Vec<PathBuf> = WalkDir::new(source)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| p.extension().is_some_and(|ext| ext == PROFILE_EXTENSION))
            .collect();
        profiles.sort();
        profiles
    }

    /// Copy every profile in `source`, overwriting existing copies
    #[instrument(skip(self), fields(source = %source.display()))]
    pub fn install(&self, source: &Path) -> Result<Vec<PathBuf>> {
        let profiles = Self::find_profiles(source);
        if profiles.is_empty() {
            return Err(SecretsError::NoProfiles(source.to_path_buf()).into());
        }

        std::fs::create_dir_all(&self.destination)?;
        let mut installed = Vec::with_capacity(profiles.len());
        for profile in profiles {
            let Some(name) = profile.file_name() else {
                continue;
            };
            let target = self.destination.join(name);
            std::fs::copy(&profile, &target)?;
            debug!(profile = %profile.display(), target = %target.display(), "installed profile");
            installed.push(target);
        }

        info!(
            count = installed.len(),
            destination = %self.destination.display(),
            "installed provisioning profiles"
        );
        Ok(installed)
    }
}
