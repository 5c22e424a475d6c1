//! Commit subject parsing

use regex::Regex;
use std::sync::LazyLock;

/// Squash merges: `Fix login crash (#123)`
static SQUASH_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(#(?P<number>\d+)\)\s*$").expect("Invalid regex"));

/// Merge commits: `Merge pull request #123 from owner/branch`
static MERGE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Merge pull request #(?P<number>\d+)").expect("Invalid regex"));

/// Pull-request number referenced by a commit subject
pub fn extract_pull_request_number(subject: &str) -> Option<u64> {
    MERGE_REGEX
        .captures(subject)
        .or_else(|| SQUASH_REGEX.captures(subject))
        .and_then(|caps| caps.name("number"))
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squash_merge() {
        assert_eq!(extract_pull_request_number("Fix login crash (#123)"), Some(123));
        assert_eq!(extract_pull_request_number("Fix (#12) and more"), None);
    }

    #[test]
    fn test_merge_commit() {
        assert_eq!(
            extract_pull_request_number("Merge pull request #45 from acme/feature/login"),
            Some(45)
        );
    }

    #[test]
    fn test_plain_commit() {
        assert_eq!(extract_pull_request_number("Bump build number"), None);
    }
}
