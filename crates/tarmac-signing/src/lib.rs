//! Tarmac Signing - Signing material installation
//!
//! Installs the provisioning profiles and the PKCS#12 signing certificate a
//! release type needs before it can be archived.

pub mod certificates;
pub mod profiles;
pub mod secrets;

pub use certificates::{CertificateImporter, EnvSecrets, SecretSource};
pub use profiles::ProfileInstaller;
pub use secrets::{SecretsInstaller, SecretsOutcome};
