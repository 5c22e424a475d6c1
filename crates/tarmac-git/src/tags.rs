//! Tag operations

use std::cmp::Ordering;

use tracing::{debug, instrument};

use crate::repository::{GitRepo, Result};

impl GitRepo {
    /// Names of every tag in the repository
    #[instrument(skip(self))]
    pub fn tag_names(&self) -> Result<Vec<String>> {
        let names = self.repo.tag_names(None)?;
        let tags: Vec<String> = names.iter().flatten().map(str::to_string).collect();
        debug!(count = tags.len(), "listed all tags");
        Ok(tags)
    }
}

/// Compare two strings the way `sort -V` does: runs of digits compare
/// numerically, everything else compares byte-wise.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = Chunks::new(a);
    let mut right = Chunks::new(b);

    loop {
        match (left.next(), right.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ordering = match (l.parse::<u128>(), r.parse::<u128>()) {
                    (Ok(ln), Ok(rn)) => ln.cmp(&rn),
                    _ => l.cmp(r),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

/// Splits a string into alternating digit and non-digit runs
struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Chunks<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let first = self.rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() != digits)
            .map(|(i, _)| i)
            .unwrap_or(self.rest.len());
        let (chunk, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(chunk)
    }
}

/// The newest tag, by descending natural order, that belongs to the build
/// identified by `prefix` (`v<version>_<build>`).
///
/// A tag belongs to the build when it contains the prefix followed by `_`
/// or ends with it, so `v9.0.0_14` never matches `v9.0.0_141_…`.
pub fn find_previous_release_tag<S: AsRef<str>>(tags: &[S], prefix: &str) -> Option<String> {
    let mut sorted: Vec<&str> = tags.iter().map(AsRef::as_ref).collect();
    sorted.sort_by(|a, b| natural_cmp(b, a));

    let delimited = format!("{}_", prefix);
    let found = sorted
        .into_iter()
        .find(|tag| tag.contains(&delimited) || tag.ends_with(prefix))
        .map(str::to_string);
    debug!(prefix, previous = ?found, "searched for previous release tag");
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commits::fixtures::repo_with_history;

    #[test]
    fn test_natural_cmp() {
        assert_eq!(natural_cmp("v9.0.0_99", "v9.0.0_100"), Ordering::Less);
        assert_eq!(natural_cmp("v10.0.0_1", "v9.9.9_1"), Ordering::Greater);
        assert_eq!(natural_cmp("v9.0.0_1_a", "v9.0.0_1_b"), Ordering::Less);
        assert_eq!(natural_cmp("v9.0.0", "v9.0.0"), Ordering::Equal);
        assert_eq!(natural_cmp("v9.0", "v9.0.1"), Ordering::Less);
    }

    #[test]
    fn test_find_previous_release_tag_picks_newest() {
        let tags = [
            "v9.0.0_141_usVendorQA_20240220",
            "v9.0.0_141_usVendorQA_20240228",
            "v9.0.0_140_usVendorQA_20240210",
            "v8.9.0_141_usAppStore_20231101",
        ];
        assert_eq!(
            find_previous_release_tag(&tags, "v9.0.0_141").as_deref(),
            Some("v9.0.0_141_usVendorQA_20240228")
        );
    }

    #[test]
    fn test_find_previous_release_tag_requires_build_boundary() {
        let tags = ["v9.0.0_1410_usIVT_20240301", "v9.0.0_141_usIVT_20240220"];
        assert_eq!(
            find_previous_release_tag(&tags, "v9.0.0_141").as_deref(),
            Some("v9.0.0_141_usIVT_20240220")
        );
        assert_eq!(find_previous_release_tag(&tags, "v9.0.0_14"), None);
    }

    #[test]
    fn test_find_previous_release_tag_none() {
        let tags: [&str; 0] = [];
        assert_eq!(find_previous_release_tag(&tags, "v9.0.0_141"), None);
    }

    #[test]
    fn test_tag_names() {
        let temp = repo_with_history(&[
            ("Initial commit", Some("v9.0.0_140_usIVT_20240210")),
            ("Fix", Some("v9.0.0_141_usIVT_20240220")),
        ]);
        let repo = GitRepo::discover(temp.path()).unwrap();

        let mut tags = repo.tag_names().unwrap();
        tags.sort();
        assert_eq!(tags, vec!["v9.0.0_140_usIVT_20240210", "v9.0.0_141_usIVT_20240220"]);
    }
}
