//! Tarmac Core - Core library for iOS release orchestration
//!
//! This crate provides the foundational types, error handling, configuration,
//! release-type registry, version resolution, artifact tracking and the
//! external command runner shared by every Tarmac crate.

pub mod artifacts;
pub mod config;
pub mod error;
pub mod process;
pub mod release_type;
pub mod tag;
pub mod version;

pub use artifacts::{parse_quoted_list, ArtifactRecord, ArtifactTracker};
pub use error::{Result, TarmacError};
pub use process::{CommandOutput, CommandRunner, CommandSpec, SystemRunner};
pub use release_type::{CertificatePair, ReleaseType, ReleaseTypeRegistry};
pub use tag::ReleaseTag;
pub use version::{previous_build_number, VersionInfo, VersionResolver};
