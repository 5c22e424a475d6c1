//! xcodebuild and ditto command builders

use std::path::Path;

use tarmac_core::CommandSpec;

/// `xcodebuild archive` for a workspace scheme
pub fn archive(workspace: &Path, scheme: &str, configuration: &str, archive_path: &Path) -> CommandSpec {
    CommandSpec::new("xcodebuild")
        .arg("archive")
        .arg("-workspace")
        .path_arg(workspace)
        .args(["-scheme", scheme])
        .args(["-configuration", configuration])
        .arg("-archivePath")
        .path_arg(archive_path)
        .args(["-destination", "generic/platform=iOS"])
}

/// `xcodebuild -exportArchive` into `export_path`
pub fn export_archive(archive_path: &Path, options_plist: &Path, export_path: &Path) -> CommandSpec {
    CommandSpec::new("xcodebuild")
        .arg("-exportArchive")
        .arg("-archivePath")
        .path_arg(archive_path)
        .arg("-exportOptionsPlist")
        .path_arg(options_plist)
        .arg("-exportPath")
        .path_arg(export_path)
}

/// Zip `source` into `destination`, keeping the top-level directory
pub fn zip(source: &Path, destination: &Path) -> CommandSpec {
    CommandSpec::new("ditto")
        .args(["-c", "-k", "--keepParent"])
        .path_arg(source)
        .path_arg(destination)
}
