//! Signing certificate import

use std::collections::HashMap;
use std::io::Write;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::{info, instrument};

use tarmac_core::error::{Result, SecretsError, TarmacError, ToolError};
use tarmac_core::{CertificatePair, CommandRunner, CommandSpec};

/// Where secret values are read from
pub trait SecretSource: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
}

/// Secrets from process environment variables
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecrets;

impl SecretSource for EnvSecrets {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl SecretSource for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

fn required(source: &dyn SecretSource, name: &str) -> Result<String> {
    source
        .get(name)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| SecretsError::MissingVariable(name.to_string()).into())
}

/// Imports base64-encoded PKCS#12 certificates into a keychain
pub struct CertificateImporter<'a> {
    runner: &'a dyn CommandRunner,
    keychain: String,
    timeout: Duration,
}

impl<'a> CertificateImporter<'a> {
    pub fn new(runner: &'a dyn CommandRunner, keychain: impl Into<String>, timeout: Duration) -> Self {
        Self {
            runner,
            keychain: keychain.into(),
            timeout,
        }
    }

    /// Decode the certificate named by `pair` and import it; a certificate
    /// already in the keychain counts as imported
    #[instrument(skip(self, secrets), fields(certificate = pair.content, keychain = %self.keychain))]
    pub async fn import(&self, pair: &CertificatePair, secrets: &dyn SecretSource) -> Result<()> {
        let content = required(secrets, pair.content)?;
        let password = required(secrets, pair.password)?;

        let cleaned: String = content.chars().filter(|c| !c.is_whitespace()).collect();
        let der = STANDARD
            .decode(cleaned)
            .map_err(|e| SecretsError::InvalidEncoding {
                name: pair.content.to_string(),
                reason: e.to_string(),
            })?;

        let mut file = tempfile::Builder::new()
            .prefix("tarmac-cert-")
            .suffix(".p12")
            .tempfile()?;
        file.write_all(&der)?;
        file.flush()?;

        let spec = CommandSpec::new("security")
            .arg("import")
            .path_arg(file.path())
            .args(["-k", self.keychain.as_str()])
            .args(["-P", password.as_str()])
            .args(["-T", "/usr/bin/codesign"])
            .redact(password.as_str());

        match self.runner.run_checked(&spec, self.timeout).await {
            Ok(_) => {
                info!("imported signing certificate");
                Ok(())
            }
            Err(TarmacError::Tool(ToolError::Failed { ref stderr, .. }))
                if stderr.contains("already exists") =>
            {
                info!("signing certificate already in keychain");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarmac_core::process::testing::ScriptedRunner;
    use tarmac_core::CommandOutput;

    const PAIR: CertificatePair = CertificatePair {
        content: "CERT_IOS_DELOITTE_DEVELOP",
        password: "CERT_IOS_DELOITTE_DEVELOP_PASSWORD",
    };

    fn secrets(content: &str) -> HashMap<String, String> {
        HashMap::from([
            (PAIR.content.to_string(), content.to_string()),
            (PAIR.password.to_string(), "s3cret".to_string()),
        ])
    }

    #[tokio::test]
    async fn test_import_runs_security_with_redacted_password() {
        let runner = ScriptedRunner::new();
        let importer = CertificateImporter::new(&runner, "build.keychain", Duration::from_secs(5));

        importer
            .import(&PAIR, &secrets(&STANDARD.encode(b"pkcs12 bytes")))
            .await
            .unwrap();

        let calls = runner.calls_to("security");
        assert_eq!(calls.len(), 1);
        let args = &calls[0].args;
        assert_eq!(args[0], "import");
        assert!(args[1].ends_with(".p12"));
        assert_eq!(&args[2..], &["-k", "build.keychain", "-P", "s3cret", "-T", "/usr/bin/codesign"]);
        assert!(!calls[0].to_string().contains("s3cret"));
    }

    #[tokio::test]
    async fn test_existing_certificate_is_success() {
        let runner = ScriptedRunner::new().on(
            "security",
            &["import"],
            CommandOutput::failed(
                1,
                "security: SecKeychainItemImport: The specified item already exists in the keychain.",
            ),
        );
        let importer = CertificateImporter::new(&runner, "login.keychain-db", Duration::from_secs(5));

        assert!(importer
            .import(&PAIR, &secrets(&STANDARD.encode(b"pkcs12")))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_other_import_failures_propagate() {
        let runner = ScriptedRunner::new().on(
            "security",
            &["import"],
            CommandOutput::failed(1, "security: MAC verification failed during PKCS12 import"),
        );
        let importer = CertificateImporter::new(&runner, "login.keychain-db", Duration::from_secs(5));

        let err = importer
            .import(&PAIR, &secrets(&STANDARD.encode(b"pkcs12")))
            .await
            .unwrap_err();
        assert!(matches!(err, TarmacError::Tool(ToolError::Failed { .. })));
    }

    #[tokio::test]
    async fn test_missing_password_variable() {
        let runner = ScriptedRunner::new();
        let importer = CertificateImporter::new(&runner, "login.keychain-db", Duration::from_secs(5));
        let only_content = HashMap::from([(PAIR.content.to_string(), "AAAA".to_string())]);

        let err = importer.import(&PAIR, &only_content).await.unwrap_err();
        assert!(matches!(
            err,
            TarmacError::Secrets(SecretsError::MissingVariable(ref name)) if name == PAIR.password
        ));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_base64() {
        let runner = ScriptedRunner::new();
        let importer = CertificateImporter::new(&runner, "login.keychain-db", Duration::from_secs(5));

        let err = importer.import(&PAIR, &secrets("not base64!")).await.unwrap_err();
        assert!(matches!(
            err,
            TarmacError::Secrets(SecretsError::InvalidEncoding { .. })
        ));
    }
}
