//! Configuration types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for Tarmac
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Version of the config schema
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Xcode project configuration
    pub project: ProjectConfig,

    /// Output directory configuration
    pub output: OutputConfig,

    /// Signing material configuration
    pub signing: SigningConfig,

    /// GitHub configuration
    pub github: GitHubConfig,

    /// Crash-diagnostics configuration
    pub crash_reporting: CrashReportingConfig,

    /// Release notes configuration
    pub release_notes: ReleaseNotesConfig,

    /// Per-stage timeouts
    pub timeouts: TimeoutsConfig,
}

/// Xcode project configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Directory containing the Xcode project
    pub path: PathBuf,

    /// Workspace file name, relative to `path`
    pub workspace: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("."),
            workspace: "App.xcworkspace".to_string(),
        }
    }
}

impl ProjectConfig {
    /// Full path to the workspace
    pub fn workspace_path(&self) -> PathBuf {
        self.path.join(&self.workspace)
    }
}

/// Output directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving every produced artifact
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
        }
    }
}

/// Signing material configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Root directory holding one sub-directory of profiles per category
    pub profile_root: PathBuf,

    /// Keychain receiving imported certificates
    pub keychain: String,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            profile_root: PathBuf::from("./.github/secrets/"),
            keychain: "login.keychain-db".to_string(),
        }
    }
}

/// GitHub configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Repository slug (`owner/name`); the current repository when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    /// REST API base URL
    pub api_url: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            repository: None,
            api_url: "https://api.github.com".to_string(),
        }
    }
}

/// Crash-diagnostics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrashReportingConfig {
    /// Base URL of the dSYM upload endpoint
    pub endpoint: String,
}

impl Default for CrashReportingConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.eum-appdynamics.com".to_string(),
        }
    }
}

/// Release notes configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseNotesConfig {
    /// Line cap of the short document attached to the release body
    pub max_lines: usize,

    /// Commits to include when no previous release tag exists
    pub fallback_commit_limit: usize,

    /// Whether to list individual commits after the pull requests
    pub include_commits: bool,
}

impl Default for ReleaseNotesConfig {
    fn default() -> Self {
        Self {
            max_lines: 500,
            fallback_commit_limit: 50,
            include_commits: true,
        }
    }
}

/// Per-stage timeouts, in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    pub query: u64,
    pub secrets: u64,
    pub archive: u64,
    pub export: u64,
    pub upload: u64,
    pub publish: u64,
    /// Each GitHub pull request lookup while collecting release notes
    pub history: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            query: 60,
            secrets: 120,
            archive: 3600,
            export: 1200,
            upload: 300,
            publish: 300,
            history: 30,
        }
    }
}

impl TimeoutsConfig {
    pub fn query(&self) -> Duration {
        Duration::from_secs(self.query)
    }

    pub fn secrets(&self) -> Duration {
        Duration::from_secs(self.secrets)
    }

    pub fn archive(&self) -> Duration {
        Duration::from_secs(self.archive)
    }

    pub fn export(&self) -> Duration {
        Duration::from_secs(self.export)
    }

    pub fn upload(&self) -> Duration {
        Duration::from_secs(self.upload)
    }

    pub fn publish(&self) -> Duration {
        Duration::from_secs(self.publish)
    }

    pub fn history(&self) -> Duration {
        Duration::from_secs(self.history)
    }
}
