//! CLI definition and command handling

pub mod output;

use std::path::PathBuf;

use clap::Parser;
use tracing::{debug, info, warn};

use tarmac_core::config::{resolve_config, validate_config, Config};
use tarmac_core::error::ConfigError;
use tarmac_core::{Result, SystemRunner};
use tarmac_git::{GitHubClient, GitRepo, RepositoryHistory};
use tarmac_signing::EnvSecrets;
use tarmac_stores::{AppDynamicsUploader, CrashReportingCredentials, SymbolUploader};
use tarmac_xcode::BuildOptions;

use crate::pipeline::{ReleasePipeline, ReleaseRequest};

/// Tarmac - iOS release orchestration
#[derive(Debug, Parser)]
#[command(name = "tarmac")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Release type to build, e.g. usVendorQA
    pub release_type: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Install the provisioning profiles of the release type
    #[arg(long)]
    pub install_profile: bool,

    /// Import the signing certificate of the release type
    #[arg(long)]
    pub install_certificate: bool,

    /// Log mutating commands instead of running them
    #[arg(long)]
    pub dry_run: bool,

    /// Write placeholder artifacts instead of archiving
    #[arg(long)]
    pub mock_archive: bool,

    /// Directory holding one provisioning profile folder per category
    #[arg(long)]
    pub profile_root: Option<PathBuf>,

    /// Export options plist; enables IPA export for exportable release types
    #[arg(long)]
    pub export_plist: Option<PathBuf>,

    /// Directory containing the Xcode project
    #[arg(long)]
    pub project_path: Option<PathBuf>,

    /// Release summary; publishing is skipped without one
    #[arg(long)]
    pub release_summary: Option<String>,

    /// Marketing version override
    #[arg(long)]
    pub release_version: Option<String>,

    /// Build number override
    #[arg(long)]
    pub release_build: Option<String>,

    /// GitHub token used for publishing and pull request lookups
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Release label shown in the release notes, e.g. R9.0
    #[arg(long = "release-tag")]
    pub release_label: Option<String>,

    /// Crash reporting account name
    #[arg(long, env = "APPD_ACCOUNT_NAME")]
    pub appd_account_name: Option<String>,

    /// Crash reporting license key
    #[arg(long, env = "APPD_LICENSE_KEY", hide_env_values = true)]
    pub appd_license_key: Option<String>,

    /// Directory receiving every produced artifact
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Configuration file (default: discovered tarmac.toml / tarmac.yaml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// Additional file to attach to the release (repeatable)
    #[arg(long = "extra-asset")]
    pub extra_assets: Vec<PathBuf>,

    /// Label of the matching --extra-asset (repeatable)
    #[arg(long = "extra-asset-label")]
    pub extra_asset_labels: Vec<String>,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}

impl Cli {
    /// Execute the release
    pub fn execute(&self) -> anyhow::Result<()> {
        let cwd = std::env::current_dir()?;
        let (mut config, config_path) = resolve_config(self.config.as_deref(), &cwd)?;
        match &config_path {
            Some(path) => debug!(path = %path.display(), "loaded configuration"),
            None => debug!("no configuration file, using defaults"),
        }
        self.apply_overrides(&mut config);
        validate_config(&config)?;

        let request = self.request()?;
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(self.execute_async(&config, &request))
    }

    async fn execute_async(&self, config: &Config, request: &ReleaseRequest) -> anyhow::Result<()> {
        info!(
            release_type = %self.release_type,
            dry_run = self.dry_run,
            mock_archive = self.mock_archive,
            "executing release"
        );

        let runner = SystemRunner::new(self.dry_run);
        let history = RepositoryHistory::new(&config.project.path, self.github_client(config));
        let uploader = self.symbol_uploader(config);

        let pipeline = ReleasePipeline::new(
            config,
            &runner,
            &EnvSecrets,
            &history,
            chrono::Local::now().date_naive(),
        )
        .with_uploader(uploader.as_ref().map(|u| u as &dyn SymbolUploader));

        let report = pipeline.run(request).await?;
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&report)?);
                output::released(report.release_type);
            }
            OutputFormat::Text => output::report(&report),
        }
        Ok(())
    }

    /// Command-line values win over the configuration file
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(path) = &self.project_path {
            config.project.path = path.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        if let Some(root) = &self.profile_root {
            config.signing.profile_root = root.clone();
        }
    }

    fn request(&self) -> Result<ReleaseRequest> {
        Ok(ReleaseRequest {
            release_type: self.release_type.clone(),
            summary: self.release_summary.clone(),
            version: self.release_version.clone(),
            build: self.release_build.clone(),
            label: self.release_label.clone(),
            build_options: BuildOptions {
                install_profile: self.install_profile,
                install_certificate: self.install_certificate,
                mock_archive: self.mock_archive,
                export_plist: self.export_plist.clone(),
            },
            extra_assets: pair_extra_assets(&self.extra_assets, &self.extra_asset_labels)?,
            github_token: self.github_token.clone(),
        })
    }

    /// Pull request lookups need a repository slug, from configuration or
    /// the `origin` remote; without one, notes list bare numbers
    fn github_client(&self, config: &Config) -> Option<GitHubClient> {
        let repository = config.github.repository.clone().or_else(|| {
            GitRepo::discover(&config.project.path)
                .and_then(|repo| repo.github_slug("origin"))
                .ok()
        })?;

        match GitHubClient::new(
            &config.github.api_url,
            &repository,
            self.github_token.clone(),
            config.timeouts.history(),
        ) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!(error = %e, "GitHub lookups disabled");
                None
            }
        }
    }

    fn symbol_uploader(&self, config: &Config) -> Option<AppDynamicsUploader> {
        let credentials = CrashReportingCredentials::from_options(
            self.appd_account_name.clone(),
            self.appd_license_key.clone(),
        )?;

        match AppDynamicsUploader::new(
            &config.crash_reporting.endpoint,
            credentials,
            config.timeouts.upload(),
        ) {
            Ok(uploader) => Some(uploader),
            Err(e) => {
                warn!(error = %e, "debug symbol upload disabled");
                None
            }
        }
    }
}

/// Zip `--extra-asset` paths with their labels; both lists must be the same length
fn pair_extra_assets(paths: &[PathBuf], labels: &[String]) -> Result<Vec<(PathBuf, String)>> {
    if paths.len() != labels.len() {
        return Err(ConfigError::MismatchedInputs {
            left: "--extra-asset".to_string(),
            left_len: paths.len(),
            right: "--extra-asset-label".to_string(),
            right_len: labels.len(),
        }
        .into());
    }
    Ok(paths.iter().cloned().zip(labels.iter().cloned()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_invocation() {
        let cli = Cli::try_parse_from([
            "tarmac",
            "usVendorQA",
            "--install-profile",
            "--dry-run",
            "--release-summary",
            "Sprint 42",
            "--release-tag",
            "R9.0",
            "--extra-asset",
            "a.zip",
            "--extra-asset-label",
            "A",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.release_type, "usVendorQA");
        assert!(cli.install_profile);
        assert!(!cli.install_certificate);
        assert!(cli.dry_run);
        assert_eq!(cli.release_label.as_deref(), Some("R9.0"));
        assert_eq!(cli.format, OutputFormat::Json);

        let request = cli.request().unwrap();
        assert_eq!(request.extra_assets, vec![(PathBuf::from("a.zip"), "A".to_string())]);
        assert!(request.build_options.install_profile);
    }

    #[test]
    fn test_mismatched_extra_assets_are_a_config_error() {
        let err = pair_extra_assets(&[PathBuf::from("a.zip"), PathBuf::from("b.zip")], &["A".to_string()])
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("--extra-asset-label"));
    }

    #[test]
    fn test_overrides_replace_config_values() {
        let cli = Cli::try_parse_from([
            "tarmac",
            "usAlpha",
            "--project-path",
            "ios",
            "--output-dir",
            "build/out",
            "--profile-root",
            "secrets",
        ])
        .unwrap();
        let mut config = Config::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.project.path, PathBuf::from("ios"));
        assert_eq!(config.output.dir, PathBuf::from("build/out"));
        assert_eq!(config.signing.profile_root, PathBuf::from("secrets"));
    }

    #[test]
    fn test_release_type_is_required() {
        assert!(Cli::try_parse_from(["tarmac"]).is_err());
    }
}
