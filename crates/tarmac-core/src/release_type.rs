//! Release-type registry
//!
//! Every distribution channel the app ships through is one row of a static
//! table. Rows are immutable and the set is closed: lookups outside it fail
//! with [`ConfigError::UnknownReleaseType`].

use serde::Serialize;

use crate::error::{ConfigError, Result};

/// Signing-certificate identity, as the names of the environment variables
/// holding the base64 PKCS#12 content and its password
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CertificatePair {
    pub content: &'static str,
    pub password: &'static str,
}

/// Build, signing and export configuration of one distribution channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseType {
    /// Identifier used on the command line and in tags
    pub id: &'static str,
    /// Product name shown to testers
    pub name: &'static str,
    /// Target market
    pub market: &'static str,
    /// Purpose tag
    pub purpose: &'static str,
    /// Xcode scheme
    pub scheme: &'static str,
    /// Xcode build configuration
    pub configuration: &'static str,
    /// Backend-service category to environment-specific identifier
    pub services: &'static [(&'static str, &'static str)],
    /// Sub-directory of the profile root holding this channel's profiles
    pub profile_category: &'static str,
    pub certificate: CertificatePair,
    /// Whether an ad-hoc IPA may be exported
    pub exportable: bool,
    /// Whether release notes are generated for this channel
    pub release_notes: bool,
}

impl ReleaseType {
    /// Service identifier for a backend category
    pub fn service(&self, category: &str) -> Option<&'static str> {
        self.services
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, id)| *id)
    }

    pub fn archive_description(&self) -> String {
        format!("{} XCArchive", self.id)
    }

    pub fn dsyms_description(&self) -> String {
        format!("{} dSYMs", self.id)
    }

    pub fn app_dsym_description(&self) -> String {
        format!("{} App dSYM", self.id)
    }

    pub fn ipa_description(&self) -> String {
        format!("{} IPA", self.id)
    }
}

const VENDOR_DEVELOP: CertificatePair = CertificatePair {
    content: "CERT_IOS_DELOITTE_DEVELOP",
    password: "CERT_IOS_DELOITTE_DEVELOP_PASSWORD",
};

const APPSTORE_DISTRIBUTION: CertificatePair = CertificatePair {
    content: "CERT_IOS_LILLY_APPSTORE_DISTRIBUTION",
    password: "CERT_IOS_LILLY_APPSTORE_DISTRIBUTION_PASSWORD",
};

const ENTERPRISE_DEVELOP: CertificatePair = CertificatePair {
    content: "CERT_IOS_LILLY_ENTERPRISE_DEVELOP",
    password: "CERT_IOS_LILLY_ENTERPRISE_DEVELOP_PASSWORD",
};

const QA_SERVICES: &[(&str, &str)] = &[("api", "qa"), ("auth", "qa"), ("analytics", "qa")];
const VALIDATION_SERVICES: &[(&str, &str)] =
    &[("api", "validation"), ("auth", "validation"), ("analytics", "validation")];
const PRODUCTION_SERVICES: &[(&str, &str)] =
    &[("api", "production"), ("auth", "production"), ("analytics", "production")];

/// Declared release types, in declaration order
pub static RELEASE_TYPES: &[ReleaseType] = &[
    ReleaseType {
        id: "usVendorQA",
        name: "Together QA",
        market: "us",
        purpose: "vendor-qa",
        scheme: "Together",
        configuration: "VendorQA",
        services: QA_SERVICES,
        profile_category: "development",
        certificate: VENDOR_DEVELOP,
        exportable: true,
        release_notes: true,
    },
    ReleaseType {
        id: "usLillyQA",
        name: "Together QA",
        market: "us",
        purpose: "qa",
        scheme: "Together",
        configuration: "QA",
        services: QA_SERVICES,
        profile_category: "distribution",
        certificate: APPSTORE_DISTRIBUTION,
        exportable: true,
        release_notes: true,
    },
    ReleaseType {
        id: "usIVT",
        name: "Together IVT",
        market: "us",
        purpose: "integration-verification-test",
        scheme: "Together",
        configuration: "IVT",
        services: VALIDATION_SERVICES,
        profile_category: "distribution",
        certificate: APPSTORE_DISTRIBUTION,
        exportable: true,
        release_notes: true,
    },
    ReleaseType {
        id: "usFBT",
        name: "Together FBT",
        market: "us",
        purpose: "functional-build-test",
        scheme: "Together",
        configuration: "FBT",
        services: VALIDATION_SERVICES,
        profile_category: "distribution",
        certificate: APPSTORE_DISTRIBUTION,
        exportable: true,
        release_notes: true,
    },
    ReleaseType {
        id: "usPenTest",
        name: "Together PenTest",
        market: "us",
        purpose: "penetration-test",
        scheme: "Together",
        configuration: "PenTest",
        services: VALIDATION_SERVICES,
        profile_category: "distribution",
        certificate: APPSTORE_DISTRIBUTION,
        exportable: true,
        release_notes: false,
    },
    ReleaseType {
        id: "usAlpha",
        name: "Together Alpha",
        market: "us",
        purpose: "enterprise-alpha",
        scheme: "Together",
        configuration: "Alpha",
        services: PRODUCTION_SERVICES,
        profile_category: "com.lilly.study.lillytogether",
        certificate: ENTERPRISE_DEVELOP,
        exportable: false,
        release_notes: true,
    },
    ReleaseType {
        id: "usAppStore",
        name: "Together",
        market: "us",
        purpose: "app-store",
        scheme: "Together",
        configuration: "Release",
        services: PRODUCTION_SERVICES,
        profile_category: "com.lilly.lillytogether",
        certificate: APPSTORE_DISTRIBUTION,
        exportable: false,
        release_notes: true,
    },
];

/// Lookup over the declared release types
#[derive(Debug, Clone, Copy)]
pub struct ReleaseTypeRegistry {
    types: &'static [ReleaseType],
}

impl Default for ReleaseTypeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ReleaseTypeRegistry {
    /// Registry over the built-in table
    pub fn builtin() -> Self {
        Self {
            types: RELEASE_TYPES,
        }
    }

    /// Resolve an identifier (case-sensitive)
    pub fn resolve(&self, id: &str) -> Result<&'static ReleaseType> {
        self.types.iter().find(|t| t.id == id).ok_or_else(|| {
            ConfigError::UnknownReleaseType {
                id: id.to_string(),
                valid: self.identifiers().map(str::to_string).collect(),
            }
            .into()
        })
    }

    /// Identifiers in declaration order
    pub fn identifiers(&self) -> impl Iterator<Item = &'static str> {
        self.types.iter().map(|t| t.id)
    }

    pub fn all(&self) -> &'static [ReleaseType] {
        self.types
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TarmacError;

    #[test]
    fn test_every_declared_type_resolves_with_signing_material() {
        let registry = ReleaseTypeRegistry::builtin();
        for id in registry.identifiers() {
            let release_type = registry.resolve(id).unwrap();
            assert_eq!(release_type.id, id);
            assert!(!release_type.profile_category.is_empty());
            assert!(!release_type.certificate.content.is_empty());
            assert_eq!(
                release_type.certificate.password,
                format!("{}_PASSWORD", release_type.certificate.content)
            );
        }
    }

    #[test]
    fn test_identifiers_in_declaration_order() {
        let ids: Vec<_> = ReleaseTypeRegistry::builtin().identifiers().collect();
        assert_eq!(
            ids,
            vec!["usVendorQA", "usLillyQA", "usIVT", "usFBT", "usPenTest", "usAlpha", "usAppStore"]
        );
    }

    #[test]
    fn test_unknown_type_lists_every_identifier() {
        let registry = ReleaseTypeRegistry::builtin();
        let err = registry.resolve("usBeta").unwrap_err();
        assert!(matches!(
            err,
            TarmacError::Config(ConfigError::UnknownReleaseType { .. })
        ));
        let message = err.to_string();
        for id in registry.identifiers() {
            assert!(message.contains(id), "{message} is missing {id}");
        }
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert!(ReleaseTypeRegistry::builtin().resolve("usvendorqa").is_err());
    }

    #[test]
    fn test_export_eligibility() {
        let registry = ReleaseTypeRegistry::builtin();
        let exportable: Vec<_> = registry
            .all()
            .iter()
            .filter(|t| t.exportable)
            .map(|t| t.id)
            .collect();
        assert_eq!(exportable, vec!["usVendorQA", "usLillyQA", "usIVT", "usFBT", "usPenTest"]);
    }

    #[test]
    fn test_signing_rows() {
        let registry = ReleaseTypeRegistry::builtin();
        let vendor = registry.resolve("usVendorQA").unwrap();
        assert_eq!(vendor.profile_category, "development");
        assert_eq!(vendor.certificate.content, "CERT_IOS_DELOITTE_DEVELOP");

        let alpha = registry.resolve("usAlpha").unwrap();
        assert_eq!(alpha.profile_category, "com.lilly.study.lillytogether");
        assert_eq!(alpha.certificate.content, "CERT_IOS_LILLY_ENTERPRISE_DEVELOP");

        let store = registry.resolve("usAppStore").unwrap();
        assert_eq!(store.profile_category, "com.lilly.lillytogether");
        assert_eq!(store.certificate.content, "CERT_IOS_LILLY_APPSTORE_DISTRIBUTION");
        assert_eq!(store.certificate.password, "CERT_IOS_LILLY_APPSTORE_DISTRIBUTION_PASSWORD");

        let qa = registry.resolve("usLillyQA").unwrap();
        assert_eq!(qa.profile_category, "distribution");
        assert_eq!(qa.certificate, store.certificate);
        assert_eq!(store.service("api"), Some("production"));
        assert!(!registry.resolve("usPenTest").unwrap().release_notes);
    }

    #[test]
    fn test_descriptions() {
        let vendor = ReleaseTypeRegistry::builtin().resolve("usVendorQA").unwrap();
        assert_eq!(vendor.archive_description(), "usVendorQA XCArchive");
        assert_eq!(vendor.dsyms_description(), "usVendorQA dSYMs");
        assert_eq!(vendor.app_dsym_description(), "usVendorQA App dSYM");
        assert_eq!(vendor.ipa_description(), "usVendorQA IPA");
    }
}
