//! Commit history operations

use chrono::{TimeZone, Utc};
use git2::{Oid, Sort};

use crate::repository::{GitRepo, Result};
use crate::types::CommitInfo;

impl GitRepo {
    /// Commits reachable from HEAD but not from `since`, newest first
    pub fn commits_since_oid(&self, since: Oid) -> Result<Vec<CommitInfo>> {
        let head = self.head_commit()?;

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(head.id())?;
        revwalk.hide(since)?;

        let mut commits = Vec::new();
        for oid in revwalk {
            let commit = self.repo.find_commit(oid?)?;
            commits.push(commit_to_info(&commit));
        }

        Ok(commits)
    }

    /// Commits since a tag, newest first
    pub fn commits_since_tag(&self, tag_name: &str) -> Result<Vec<CommitInfo>> {
        let tag_ref = format!("refs/tags/{}", tag_name);
        let reference = self.repo.find_reference(&tag_ref)?;
        let target = reference.peel_to_commit()?;

        self.commits_since_oid(target.id())
    }

    /// The most recent `count` commits
    pub fn recent_commits(&self, count: usize) -> Result<Vec<CommitInfo>> {
        let head = self.head_commit()?;

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(head.id())?;

        let mut commits = Vec::new();
        for oid in revwalk.take(count) {
            let commit = self.repo.find_commit(oid?)?;
            commits.push(commit_to_info(&commit));
        }

        Ok(commits)
    }
}

/// Convert a git2 Commit to CommitInfo
fn commit_to_info(commit: &git2::Commit<'_>) -> CommitInfo {
    let author = commit.author();
    let timestamp = Utc
        .timestamp_opt(commit.time().seconds(), 0)
        .single()
        .unwrap_or_else(Utc::now);

    CommitInfo::new(
        commit.id().to_string(),
        commit.summary().unwrap_or("(no message)"),
        author.name().unwrap_or("Unknown"),
        timestamp,
    )
}
