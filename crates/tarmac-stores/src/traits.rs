//! Symbol uploader trait

use crate::error::Result;
use crate::types::UploadReport;
use std::path::PathBuf;

/// Uploads debug-symbol archives to a crash-diagnostics service
#[async_trait::async_trait]
pub trait SymbolUploader: Send + Sync {
    /// Service name, for logs
    fn name(&self) -> &str;

    /// Upload every file, stopping at the first failure
    async fn upload(&self, files: &[PathBuf]) -> Result<UploadReport>;
}
