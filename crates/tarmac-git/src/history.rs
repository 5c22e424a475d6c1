//! Release history source
//!
//! The release-note pipeline reads tags, commits and pull requests through
//! [`HistorySource`] so it can be exercised without a repository or network.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, instrument};

use tarmac_core::Result;

use crate::github::GitHubClient;
use crate::repository::GitRepo;
use crate::types::{CommitInfo, PullRequest};

/// Source-control history needed to describe a release
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Every tag name, in no particular order
    async fn tags(&self) -> Result<Vec<String>>;

    /// Commits after `tag` up to HEAD, newest first; without a tag, the
    /// `limit` most recent commits
    async fn commits_since(&self, tag: Option<&str>, limit: usize) -> Result<Vec<CommitInfo>>;

    /// Look up a pull request by number; `None` when unknown
    async fn pull_request(&self, number: u64) -> Result<Option<PullRequest>>;
}

/// History read from a local repository, enriched by GitHub when configured
pub struct RepositoryHistory {
    path: PathBuf,
    github: Option<GitHubClient>,
}

impl RepositoryHistory {
    pub fn new(path: impl Into<PathBuf>, github: Option<GitHubClient>) -> Self {
        Self {
            path: path.into(),
            github,
        }
    }

    fn open(&self) -> Result<GitRepo> {
        Ok(GitRepo::discover(&self.path)?)
    }
}

#[async_trait]
impl HistorySource for RepositoryHistory {
    #[instrument(skip(self))]
    async fn tags(&self) -> Result<Vec<String>> {
        Ok(self.open()?.tag_names()?)
    }

    #[instrument(skip(self))]
    async fn commits_since(&self, tag: Option<&str>, limit: usize) -> Result<Vec<CommitInfo>> {
        let repo = self.open()?;
        let commits = match tag {
            Some(tag) => repo.commits_since_tag(tag)?,
            None => repo.recent_commits(limit)?,
        };
        debug!(count = commits.len(), "collected commits");
        Ok(commits)
    }

    async fn pull_request(&self, number: u64) -> Result<Option<PullRequest>> {
        match &self.github {
            Some(github) => Ok(github.pull_request(number).await?),
            None => Ok(None),
        }
    }
}
