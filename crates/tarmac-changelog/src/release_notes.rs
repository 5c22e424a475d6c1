//! Human-readable release notes generation

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use tarmac_core::config::ReleaseNotesConfig;
use tarmac_core::{ReleaseType, Result, VersionInfo};
use tarmac_git::{find_previous_release_tag, CommitInfo, HistorySource, PullRequest};

use crate::parser::extract_pull_request_number;

/// Appended to the short document when the full one exceeds the line cap
pub const TRUNCATION_NOTICE: &str = "\n\n**IMPORTANT**: This changelog has been truncated due to the size limitation of GitHub releases. Please download the Full Release Notes from Assets below.\n";

/// What the notes describe
#[derive(Debug, Clone)]
pub struct ReleaseNoteContext<'a> {
    pub release_type: &'a ReleaseType,
    pub version: &'a VersionInfo,
    pub date: NaiveDate,
    pub summary: &'a str,
    /// Operator-facing release label, e.g. `R9.0`
    pub label: Option<&'a str>,
}

/// Full and size-capped release notes of one build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseNotes {
    pub full: String,
    pub short: String,
    pub previous_tag: Option<String>,
    pub truncated: bool,
}

/// A pull request entry, resolved or known only by number
#[derive(Debug, Clone)]
enum PullEntry {
    Resolved(PullRequest),
    Unresolved { number: u64, subject: String },
}

/// Keep the first `max_lines` lines and append [`TRUNCATION_NOTICE`] when
/// `doc` has more than `max_lines` lines; otherwise return it unchanged.
pub fn truncate(doc: &str, max_lines: usize) -> String {
    if doc.lines().count() <= max_lines {
        return doc.to_string();
    }
    let kept: Vec<&str> = doc.lines().take(max_lines).collect();
    format!("{}{}", kept.join("\n"), TRUNCATION_NOTICE)
}

/// Generates release notes from release history
pub struct ReleaseNotesGenerator {
    config: ReleaseNotesConfig,
}

impl ReleaseNotesGenerator {
    pub fn new(config: ReleaseNotesConfig) -> Self {
        Self { config }
    }

    /// Collect history since the previous build and render both documents
    #[instrument(skip_all, fields(release_type = ctx.release_type.id, build = %ctx.version.build_number))]
    pub async fn generate(
        &self,
        ctx: &ReleaseNoteContext<'_>,
        history: &dyn HistorySource,
    ) -> Result<ReleaseNotes> {
        let prefix = ctx.version.tag_prefix(1);
        let tags = history.tags().await?;
        let previous_tag = find_previous_release_tag(tags.as_slice(), &prefix);
        if previous_tag.is_none() {
            info!(
                prefix = %prefix,
                limit = self.config.fallback_commit_limit,
                "no previous release tag, using recent commits"
            );
        }

        let commits = history
            .commits_since(previous_tag.as_deref(), self.config.fallback_commit_limit)
            .await?;
        let pulls = self.pull_requests(&commits, history).await;

        let full = self.format_markdown(ctx, previous_tag.as_deref(), &pulls, &commits);
        let short = truncate(&full, self.config.max_lines);
        let truncated = short != full;
        debug!(
            full_lines = full.lines().count(),
            short_lines = short.lines().count(),
            full_bytes = full.len(),
            short_bytes = short.len(),
            truncated,
            "release notes generated"
        );

        Ok(ReleaseNotes {
            full,
            short,
            previous_tag,
            truncated,
        })
    }

    /// Pull requests referenced by the commits, in commit order, once each
    async fn pull_requests(&self, commits: &[CommitInfo], history: &dyn HistorySource) -> Vec<PullEntry> {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();

        for commit in commits {
            let Some(number) = extract_pull_request_number(&commit.message) else {
                continue;
            };
            if !seen.insert(number) {
                continue;
            }

            let entry = match history.pull_request(number).await {
                Ok(Some(pull)) => PullEntry::Resolved(pull),
                Ok(None) => PullEntry::Unresolved {
                    number,
                    subject: commit.message.clone(),
                },
                Err(e) => {
                    warn!(number, error = %e, "pull request lookup failed");
                    PullEntry::Unresolved {
                        number,
                        subject: commit.message.clone(),
                    }
                }
            };
            entries.push(entry);
        }

        entries
    }

    fn format_markdown(
        &self,
        ctx: &ReleaseNoteContext<'_>,
        previous_tag: Option<&str>,
        pulls: &[PullEntry],
        commits: &[CommitInfo],
    ) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "# {} {} ({})\n\n",
            ctx.release_type.name, ctx.version.marketing_version, ctx.version.build_number
        ));

        output.push_str("| | |\n|---|---|\n");
        output.push_str(&format!("| Version | {} |\n", ctx.version.marketing_version));
        output.push_str(&format!("| Build | {} |\n", ctx.version.build_number));
        output.push_str(&format!("| Date | {} |\n", ctx.date.format("%Y-%m-%d")));
        output.push_str(&format!("| Release type | {} |\n", ctx.release_type.id));
        if let Some(label) = ctx.label.filter(|l| !l.is_empty()) {
            output.push_str(&format!("| Release | {} |\n", label));
        }
        output.push_str(&format!(
            "| Previous release | {} |\n\n",
            previous_tag.unwrap_or("_none_")
        ));

        output.push_str("## Summary\n\n");
        output.push_str(ctx.summary.trim());
        output.push_str("\n\n");

        output.push_str("## Pull Requests\n\n");
        if pulls.is_empty() {
            output.push_str("_No pull requests._\n");
        }
        for entry in pulls {
            match entry {
                PullEntry::Resolved(pull) if !pull.author.is_empty() => output.push_str(&format!(
                    "- [#{}]({}) {} (@{})\n",
                    pull.number, pull.url, pull.title, pull.author
                )),
                PullEntry::Resolved(pull) => output.push_str(&format!(
                    "- [#{}]({}) {}\n",
                    pull.number, pull.url, pull.title
                )),
                PullEntry::Unresolved { number, subject } => {
                    output.push_str(&format!("- #{} {}\n", number, subject))
                }
            }
        }

        if self.config.include_commits {
            output.push_str("\n## Commits\n\n");
            if commits.is_empty() {
                output.push_str("_No commits._\n");
            }
            for commit in commits {
                output.push_str(&format!(
                    "- `{}` {} ({})\n",
                    commit.short_hash, commit.message, commit.author
                ));
            }
        }

        output
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use chrono::Utc;

    use super::*;

    /// In-memory history
    #[derive(Default)]
    pub struct StaticHistory {
        pub tags: Vec<String>,
        pub commits: Vec<CommitInfo>,
        pub pulls: HashMap<u64, PullRequest>,
        pub requested_since: std::sync::Mutex<Vec<Option<String>>>,
    }

    impl StaticHistory {
        pub fn with_commits(subjects: &[&str]) -> Self {
            Self {
                commits: subjects
                    .iter()
                    .enumerate()
                    .map(|(i, s)| CommitInfo::new(format!("{:040x}", i + 1), *s, "Dev", Utc::now()))
                    .collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl HistorySource for StaticHistory {
        async fn tags(&self) -> Result<Vec<String>> {
            Ok(self.tags.clone())
        }

        async fn commits_since(&self, tag: Option<&str>, limit: usize) -> Result<Vec<CommitInfo>> {
            self.requested_since
                .lock()
                .unwrap()
                .push(tag.map(str::to_string));
            let take = if tag.is_some() { self.commits.len() } else { limit };
            Ok(self.commits.iter().take(take).cloned().collect())
        }

        async fn pull_request(&self, number: u64) -> Result<Option<PullRequest>> {
            Ok(self.pulls.get(&number).cloned())
        }
    }
}
