//! Debug-symbol upload adapters for Tarmac
//!
//! After a successful archive the dSYM bundles are pushed to the
//! crash-diagnostics service so crashes from the build symbolicate.
//!
//! ## Usage
//!
//! ```ignore
//! use tarmac_stores::{AppDynamicsUploader, CrashReportingCredentials, SymbolUploader};
//!
//! let credentials = CrashReportingCredentials::from_options(account, key).unwrap();
//! let uploader = AppDynamicsUploader::new(endpoint, credentials, timeout)?;
//! uploader.upload(&[dsyms_zip, app_dsym_zip]).await?;
//! ```

pub mod appdynamics;
pub mod error;
pub mod traits;
pub mod types;

pub use appdynamics::AppDynamicsUploader;
pub use error::{Result, StoreError};
pub use traits::SymbolUploader;
pub use types::{CrashReportingCredentials, UploadReport};
