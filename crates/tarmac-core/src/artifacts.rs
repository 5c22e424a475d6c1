//! Produced-artifact bookkeeping

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

/// One produced file and the label it is published under
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactRecord {
    pub path: PathBuf,
    pub description: String,
}

impl ArtifactRecord {
    /// `path#description`, the form release hosts take for labelled uploads
    pub fn upload_arg(&self) -> String {
        format!("{}#{}", self.path.display(), self.description)
    }
}

/// Ordered, append-only list of artifacts produced during a run.
///
/// Records are never reordered, removed or deduplicated: publication
/// attaches them in exactly the order they were recorded.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ArtifactTracker {
    records: Vec<ArtifactRecord>,
}

impl ArtifactTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, path: impl Into<PathBuf>, description: impl Into<String>) {
        let record = ArtifactRecord {
            path: path.into(),
            description: description.into(),
        };
        debug!(path = %record.path.display(), description = %record.description, "recorded artifact");
        self.records.push(record);
    }

    pub fn all(&self) -> &[ArtifactRecord] {
        &self.records
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.records.iter().map(|r| r.path.as_path())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Space-separated, single-quoted paths with embedded quotes escaped
    pub fn render_as_quoted_list(&self) -> String {
        self.records
            .iter()
            .map(|r| quote(&r.path.to_string_lossy()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// `path#description` for every record, in order
    pub fn upload_args(&self) -> Vec<String> {
        self.records.iter().map(ArtifactRecord::upload_arg).collect()
    }
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Inverse of [`ArtifactTracker::render_as_quoted_list`]
pub fn parse_quoted_list(list: &str) -> Vec<PathBuf> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut in_item = false;
    let mut quoted = false;
    let mut chars = list.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                quoted = !quoted;
                in_item = true;
            }
            '\\' if !quoted => {
                if let Some(next) = chars.next() {
                    current.push(next);
                    in_item = true;
                }
            }
            c if c.is_whitespace() && !quoted => {
                if in_item {
                    items.push(PathBuf::from(std::mem::take(&mut current)));
                    in_item = false;
                }
            }
            c => {
                current.push(c);
                in_item = true;
            }
        }
    }
    if in_item {
        items.push(PathBuf::from(current));
    }
    items
}
