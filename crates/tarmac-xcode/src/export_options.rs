//! Export options plist

use std::path::{Path, PathBuf};

use tarmac_core::error::ConfigError;
use tarmac_core::Result;

/// A validated `-exportOptionsPlist` file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    path: PathBuf,
    method: String,
}

impl ExportOptions {
    /// Parse the plist at `path`; it must be a dictionary with a string `method`
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()).into());
        }

        let options: plist::Dictionary =
            plist::from_file(path).map_err(|e| ConfigError::InvalidValue {
                field: "export-plist".to_string(),
                message: format!("{}: {}", path.display(), e),
            })?;

        let method = options
            .get("method")
            .and_then(|v| v.as_string())
            .filter(|m| !m.is_empty())
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "export-plist".to_string(),
                message: format!("{} has no 'method' key", path.display()),
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            method: method.to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Distribution method, e.g. `development` or `ad-hoc`
    pub fn method(&self) -> &str {
        &self.method
    }
}
