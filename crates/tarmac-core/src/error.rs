//! Error types for Tarmac

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using TarmacError
pub type Result<T> = std::result::Result<T, TarmacError>;

/// Main error type for Tarmac operations
#[derive(Debug, Error)]
pub enum TarmacError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Operator input rejected before any work started
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// External tool errors
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// Version or build number query produced nothing usable
    #[error("Version query `{command}` returned no output")]
    VersionQuery { command: String, output: String },

    /// Signing material errors
    #[error(transparent)]
    Secrets(#[from] SecretsError),

    /// Git and release history errors
    #[error(transparent)]
    Git(#[from] GitError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A pipeline stage failed
    #[error("Stage '{stage}' failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<TarmacError>,
    },
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Release type identifier is not in the registry
    #[error("Unknown release type '{id}'. Valid release types: {}", .valid.join(", "))]
    UnknownReleaseType { id: String, valid: Vec<String> },

    /// Paired inputs have different lengths
    #[error("Mismatched inputs: {left} has {left_len} entries but {right} has {right_len}")]
    MismatchedInputs {
        left: String,
        left_len: usize,
        right: String,
        right_len: usize,
    },

    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Operator input validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Publishing needs a summary with content
    #[error("A non-empty release summary is required to publish a release. Omit --release-summary to skip publishing.")]
    EmptySummary,
}

/// External tool errors
#[derive(Debug, Error)]
pub enum ToolError {
    /// The tool ran and exited unsuccessfully
    #[error("Command `{command}` failed with exit code {}", .exit_code.map(|c| c.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    Failed {
        command: String,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// The tool did not finish in time and was killed
    #[error("External tool timed out after {seconds}s: `{command}`")]
    TimedOut { command: String, seconds: u64 },

    /// The tool is not installed
    #[error("Required tool '{tool}' not found. {hint}")]
    NotFound { tool: String, hint: String },

    /// The tool could not be started
    #[error("Failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

impl ToolError {
    /// Captured stdout, when the tool got far enough to produce any
    pub fn stdout(&self) -> Option<&str> {
        match self {
            Self::Failed { stdout, .. } => Some(stdout),
            _ => None,
        }
    }

    /// Captured stderr, when the tool got far enough to produce any
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::Failed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

/// Signing material errors
#[derive(Debug, Error)]
pub enum SecretsError {
    /// Secret variable is not set
    #[error("Secret variable '{0}' is not set")]
    MissingVariable(String),

    /// Secret content could not be decoded
    #[error("Secret variable '{name}' is not valid base64: {reason}")]
    InvalidEncoding { name: String, reason: String },

    /// No profiles at the expected location
    #[error("No provisioning profiles found in {0}")]
    NoProfiles(PathBuf),

    /// Provisioning profile store could not be located
    #[error("Provisioning profile directory unavailable: {0}")]
    ProfileStoreUnavailable(String),
}

/// Git-related errors
#[derive(Debug, Error)]
pub enum GitError {
    /// Not a git repository
    #[error("Not a git repository: {0}")]
    NotARepository(PathBuf),

    /// Failed to open repository
    #[error("Failed to open repository: {0}")]
    OpenFailed(String),

    /// Remote is missing or does not point at GitHub
    #[error("Remote '{0}' is not a GitHub repository")]
    UnsupportedRemote(String),

    /// GitHub API request failed
    #[error("GitHub API error{}: {message}", .status.map(|s| format!(" ({})", s)).unwrap_or_default())]
    GitHubApi { status: Option<u16>, message: String },

    /// GitHub API request did not complete in time
    #[error("GitHub API request timed out after {seconds}s")]
    GitHubTimeout { seconds: u64 },

    /// Git2 library error
    #[error("Git error: {0}")]
    Git2(#[from] git2::Error),
}

impl TarmacError {
    /// Attach the name of the stage that produced this error
    pub fn at_stage(self, stage: &'static str) -> Self {
        match self {
            already @ Self::Stage { .. } => already,
            other => Self::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// Innermost error, skipping stage wrappers
    pub fn root(&self) -> &TarmacError {
        match self {
            Self::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// Name of the failed stage, if known
    pub fn stage(&self) -> Option<&'static str> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Get exit code for CLI
    pub fn exit_code(&self) -> i32 {
        match self.root() {
            Self::Config(_) => 2,
            Self::Git(GitError::GitHubTimeout { .. }) => 9,
            Self::Git(_) => 3,
            Self::VersionQuery { .. } => 4,
            Self::Validation(_) => 5,
            Self::Secrets(_) => 6,
            Self::Io(_) => 7,
            Self::Tool(ToolError::TimedOut { .. }) => 9,
            Self::Tool(ToolError::Failed { exit_code, .. }) => match exit_code {
                Some(code) if *code != 0 => *code,
                _ => 10,
            },
            Self::Tool(_) => 10,
            Self::Stage { .. } => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_release_type_lists_valid_ids() {
        let err = ConfigError::UnknownReleaseType {
            id: "nope".to_string(),
            valid: vec!["usVendorQA".to_string(), "usAppStore".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("nope"));
        assert!(message.contains("usVendorQA, usAppStore"));
    }

    #[test]
    fn test_exit_code_propagates_tool_status() {
        let err = TarmacError::from(ToolError::Failed {
            command: "xcodebuild archive".to_string(),
            exit_code: Some(65),
            stdout: String::new(),
            stderr: "signing identity not found".to_string(),
        })
        .at_stage("archive");

        assert_eq!(err.exit_code(), 65);
        assert_eq!(err.stage(), Some("archive"));
        assert!(err.to_string().contains("archive"));
    }

    #[test]
    fn test_stage_is_not_wrapped_twice() {
        let err = TarmacError::from(ValidationError::EmptySummary)
            .at_stage("publish")
            .at_stage("pipeline");
        assert_eq!(err.stage(), Some("publish"));
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_github_timeout_uses_timeout_exit_code() {
        let err = TarmacError::from(GitError::GitHubTimeout { seconds: 30 }).at_stage("notes");
        assert_eq!(err.exit_code(), 9);
        assert_eq!(
            GitError::GitHubTimeout { seconds: 30 }.to_string(),
            "GitHub API request timed out after 30s"
        );
    }
}
