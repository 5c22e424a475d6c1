//! Remote operations

use tarmac_core::error::GitError;

use crate::repository::{GitRepo, Result};

impl GitRepo {
    /// Get the URL for a remote
    pub fn remote_url(&self, name: &str) -> Result<Option<String>> {
        match self.repo.find_remote(name) {
            Ok(remote) => Ok(remote.url().map(|s| s.to_string())),
            Err(e) if e.code() == git2::ErrorCode::NotFound => {
                Err(GitError::UnsupportedRemote(name.to_string()))
            }
            Err(e) => Err(GitError::Git2(e)),
        }
    }

    /// `owner/name` of the GitHub repository behind a remote
    pub fn github_slug(&self, remote: &str) -> Result<String> {
        self.remote_url(remote)?
            .as_deref()
            .and_then(parse_github_slug)
            .ok_or_else(|| GitError::UnsupportedRemote(remote.to_string()))
    }
}

/// Extract `owner/name` from an SSH or HTTPS GitHub remote URL
pub fn parse_github_slug(url: &str) -> Option<String> {
    let path = url
        .strip_prefix("git@github.com:")
        .or_else(|| url.strip_prefix("ssh://git@github.com/"))
        .or_else(|| url.strip_prefix("https://github.com/"))
        .or_else(|| url.strip_prefix("http://github.com/"))?;
    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);

    let mut parts = path.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
            Some(format!("{}/{}", owner, name))
        }
        _ => None,
    }
}
