//! Tarmac Git - Release history and publishing
//!
//! This crate reads release history from the local repository (tags and
//! commits through libgit2), looks up pull requests on GitHub, and publishes
//! tagged prereleases through the GitHub CLI.

mod commits;
pub mod github;
pub mod history;
pub mod publish;
mod remote;
mod repository;
mod tags;
pub mod types;

pub use github::GitHubClient;
pub use history::{HistorySource, RepositoryHistory};
pub use publish::{ReleaseBody, ReleasePublisher};
pub use remote::parse_github_slug;
pub use repository::{GitRepo, Result};
pub use tags::{find_previous_release_tag, natural_cmp};
pub use types::{CommitInfo, PullRequest};
