//! Common types for symbol uploaders

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Account credentials of the crash-diagnostics service
#[derive(Clone)]
pub struct CrashReportingCredentials {
    pub account_name: String,
    pub license_key: String,
}

impl CrashReportingCredentials {
    /// Credentials when both values are present and non-empty
    pub fn from_options(account_name: Option<String>, license_key: Option<String>) -> Option<Self> {
        match (account_name, license_key) {
            (Some(account_name), Some(license_key))
                if !account_name.is_empty() && !license_key.is_empty() =>
            {
                Some(Self {
                    account_name,
                    license_key,
                })
            }
            _ => None,
        }
    }
}

impl fmt::Debug for CrashReportingCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrashReportingCredentials")
            .field("account_name", &self.account_name)
            .field("license_key", &"********")
            .finish()
    }
}

/// Files accepted by the service
#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadReport {
    pub uploaded: Vec<PathBuf>,
}
