//! Output file layout

use std::path::{Path, PathBuf};

use tarmac_core::{ReleaseTag, ReleaseType};

/// Paths of everything a build writes under the output directory
#[derive(Debug, Clone)]
pub struct OutputLayout {
    dir: PathBuf,
    tag: ReleaseTag,
    release_type: &'static str,
}

impl OutputLayout {
    pub fn new(dir: impl Into<PathBuf>, tag: ReleaseTag, release_type: &ReleaseType) -> Self {
        Self {
            dir: dir.into(),
            tag,
            release_type: release_type.id,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn tag(&self) -> &ReleaseTag {
        &self.tag
    }

    /// `output/<id>.xcarchive`
    pub fn archive_bundle(&self) -> PathBuf {
        self.dir.join(format!("{}.xcarchive", self.release_type))
    }

    pub fn archive_zip(&self) -> PathBuf {
        self.dir.join(self.tag.file_name(".xcarchive.zip"))
    }

    pub fn dsyms_zip(&self) -> PathBuf {
        self.dir.join(self.tag.file_name(".dsyms.zip"))
    }

    pub fn app_dsym_zip(&self) -> PathBuf {
        self.dir.join(self.tag.file_name(".app.dsym.zip"))
    }

    /// Directory `xcodebuild -exportArchive` writes into
    pub fn export_dir(&self) -> PathBuf {
        self.dir.join("ipa")
    }

    pub fn ipa(&self) -> PathBuf {
        self.dir.join(self.tag.file_name(".ipa"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tarmac_core::{ReleaseTypeRegistry, VersionInfo};

    #[test]
    fn test_paths_share_one_tag() {
        let release_type = ReleaseTypeRegistry::builtin().resolve("usVendorQA").unwrap();
        let tag = ReleaseTag::new(
            &VersionInfo::new("9.0.0", "142"),
            release_type,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        );
        let layout = OutputLayout::new("output", tag, release_type);

        assert_eq!(layout.archive_bundle(), PathBuf::from("output/usVendorQA.xcarchive"));
        assert_eq!(
            layout.archive_zip(),
            PathBuf::from("output/v9.0.0_142_usVendorQA_20240301.xcarchive.zip")
        );
        assert_eq!(
            layout.dsyms_zip(),
            PathBuf::from("output/v9.0.0_142_usVendorQA_20240301.dsyms.zip")
        );
        assert_eq!(
            layout.app_dsym_zip(),
            PathBuf::from("output/v9.0.0_142_usVendorQA_20240301.app.dsym.zip")
        );
        assert_eq!(layout.export_dir(), PathBuf::from("output/ipa"));
        assert_eq!(layout.ipa(), PathBuf::from("output/v9.0.0_142_usVendorQA_20240301.ipa"));
    }
}
