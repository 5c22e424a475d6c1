//! Signing setup for a release type

use std::path::PathBuf;
use std::time::Duration;

use tracing::{info, instrument};

use tarmac_core::config::SigningConfig;
use tarmac_core::{CommandRunner, ReleaseType, Result};

use crate::certificates::{CertificateImporter, SecretSource};
use crate::profiles::ProfileInstaller;

/// What signing setup did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretsOutcome {
    pub profiles_installed: usize,
    pub certificate_imported: bool,
}

/// Installs the profiles and certificate of a release type
pub struct SecretsInstaller<'a> {
    runner: &'a dyn CommandRunner,
    secrets: &'a dyn SecretSource,
    profile_root: PathBuf,
    profile_destination: Option<PathBuf>,
    keychain: String,
    timeout: Duration,
}

impl<'a> SecretsInstaller<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        secrets: &'a dyn SecretSource,
        config: &SigningConfig,
        timeout: Duration,
    ) -> Self {
        Self {
            runner,
            secrets,
            profile_root: config.profile_root.clone(),
            profile_destination: None,
            keychain: config.keychain.clone(),
            timeout,
        }
    }

    /// Install profiles somewhere other than the current user's library
    pub fn with_profile_destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.profile_destination = Some(destination.into());
        self
    }

    fn profile_installer(&self) -> Result<ProfileInstaller> {
        match &self.profile_destination {
            Some(dest) => Ok(ProfileInstaller::new(dest)),
            None => ProfileInstaller::for_current_user(),
        }
    }

    /// Install what the flags ask for.
    ///
    /// Profile copying is skipped in dry-run. Certificate secrets are still
    /// read and decoded in dry-run so missing variables surface early; only
    /// the keychain import itself is suppressed.
    #[instrument(skip(self, release_type), fields(release_type = release_type.id))]
    pub async fn configure(
        &self,
        release_type: &ReleaseType,
        install_profile: bool,
        install_certificate: bool,
    ) -> Result<SecretsOutcome> {
        let mut outcome = SecretsOutcome::default();

        if install_profile {
            let source = self.profile_root.join(release_type.profile_category);
            if self.runner.dry_run() {
                info!(source = %source.display(), "dry run, not installing provisioning profiles");
            } else {
                outcome.profiles_installed = self.profile_installer()?.install(&source)?.len();
            }
        }

        if install_certificate {
            CertificateImporter::new(self.runner, self.keychain.as_str(), self.timeout)
                .import(&release_type.certificate, self.secrets)
                .await?;
            outcome.certificate_imported = !self.runner.dry_run();
        }

        if !install_profile && !install_certificate {
            info!("no signing material requested");
        }
        Ok(outcome)
    }
}
