//! AppDynamics dSYM upload
//!
//! `PUT {endpoint}/v2/account/{account}/ios-dsym` with the zipped dSYM as
//! the body, authenticated with the account name and license key.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, info, instrument};
use url::Url;

use crate::error::{Result, StoreError};
use crate::traits::SymbolUploader;
use crate::types::{CrashReportingCredentials, UploadReport};

/// Default upload endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.eum-appdynamics.com";

/// Uploads dSYM archives to AppDynamics
pub struct AppDynamicsUploader {
    client: Client,
    upload_url: Url,
    credentials: CrashReportingCredentials,
}

impl AppDynamicsUploader {
    pub fn new(endpoint: &str, credentials: CrashReportingCredentials, timeout: Duration) -> Result<Self> {
        let mut upload_url = Url::parse(endpoint)
            .map_err(|e| StoreError::ConfigurationError(format!("invalid endpoint '{}': {}", endpoint, e)))?;
        upload_url
            .path_segments_mut()
            .map_err(|_| StoreError::ConfigurationError(format!("endpoint '{}' cannot be a base", endpoint)))?
            .pop_if_empty()
            .extend(["v2", "account", credentials.account_name.as_str(), "ios-dsym"]);

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            upload_url,
            credentials,
        })
    }

    pub fn upload_url(&self) -> &Url {
        &self.upload_url
    }

    async fn upload_one(&self, path: &Path) -> Result<()> {
        let body = tokio::fs::read(path).await.map_err(|e| {
            StoreError::InvalidArtifact(format!("cannot read {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), bytes = body.len(), "uploading dSYM");

        let response = self
            .client
            .put(self.upload_url.clone())
            .basic_auth(&self.credentials.account_name, Some(&self.credentials.license_key))
            .header("Content-Type", "application/octet-stream")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    StoreError::Timeout(format!("uploading {}", path.display()))
                } else {
                    StoreError::Http(e)
                }
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(StoreError::AuthenticationFailed(format!(
                "account '{}' was rejected ({})",
                self.credentials.account_name, status
            )));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::ApiError {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl SymbolUploader for AppDynamicsUploader {
    fn name(&self) -> &str {
        "AppDynamics"
    }

    #[instrument(skip(self, files), fields(count = files.len()))]
    async fn upload(&self, files: &[PathBuf]) -> Result<UploadReport> {
        let mut report = UploadReport::default();
        for path in files {
            self.upload_one(path).await?;
            report.uploaded.push(path.clone());
        }
        info!(count = report.uploaded.len(), "uploaded dSYMs");
        Ok(report)
    }
}
