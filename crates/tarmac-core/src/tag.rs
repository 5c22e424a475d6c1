//! Release tags

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::release_type::ReleaseType;
use crate::version::VersionInfo;

/// `v<version>_<build>_<releaseType>_<YYYYMMDD>`
///
/// The date is the run date captured once at startup; every artifact name
/// and the published tag are rendered from the same value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub struct ReleaseTag {
    version: VersionInfo,
    release_type: &'static str,
    date: NaiveDate,
}

impl ReleaseTag {
    pub fn new(version: &VersionInfo, release_type: &ReleaseType, date: NaiveDate) -> Self {
        Self {
            version: version.clone(),
            release_type: release_type.id,
            date,
        }
    }

    /// File name made of this tag and `suffix`
    pub fn file_name(&self, suffix: &str) -> String {
        format!("{}{}", self, suffix)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

impl fmt::Display for ReleaseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}",
            self.version.tag_prefix(0),
            self.release_type,
            self.date.format("%Y%m%d")
        )
    }
}

impl From<ReleaseTag> for String {
    fn from(tag: ReleaseTag) -> Self {
        tag.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release_type::ReleaseTypeRegistry;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_vendor_qa_tag() {
        let registry = ReleaseTypeRegistry::builtin();
        let tag = ReleaseTag::new(
            &VersionInfo::new("9.0.0", "142"),
            registry.resolve("usVendorQA").unwrap(),
            date(2024, 3, 1),
        );
        assert_eq!(tag.to_string(), "v9.0.0_142_usVendorQA_20240301");
        assert_eq!(
            tag.file_name(".xcarchive.zip"),
            "v9.0.0_142_usVendorQA_20240301.xcarchive.zip"
        );
    }

    #[test]
    fn test_tag_is_deterministic_and_input_sensitive() {
        let registry = ReleaseTypeRegistry::builtin();
        let qa = registry.resolve("usLillyQA").unwrap();
        let version = VersionInfo::new("9.0.0", "142");
        let base = ReleaseTag::new(&version, qa, date(2024, 3, 1));

        assert_eq!(base, ReleaseTag::new(&version, qa, date(2024, 3, 1)));
        assert_ne!(
            base.to_string(),
            ReleaseTag::new(&VersionInfo::new("9.0.1", "142"), qa, date(2024, 3, 1)).to_string()
        );
        assert_ne!(
            base.to_string(),
            ReleaseTag::new(&VersionInfo::new("9.0.0", "143"), qa, date(2024, 3, 1)).to_string()
        );
        assert_ne!(
            base.to_string(),
            ReleaseTag::new(&version, registry.resolve("usIVT").unwrap(), date(2024, 3, 1))
                .to_string()
        );
        assert_ne!(
            base.to_string(),
            ReleaseTag::new(&version, qa, date(2024, 3, 2)).to_string()
        );
    }
}
