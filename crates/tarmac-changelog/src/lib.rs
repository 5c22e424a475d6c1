//! Tarmac Changelog - Release note generation
//!
//! Builds the markdown release notes of a build from the commits and pull
//! requests merged since the previous build, and derives the size-capped
//! variant used as the release body.

pub mod parser;
pub mod pipeline;
pub mod release_notes;

pub use parser::extract_pull_request_number;
pub use pipeline::ReleaseNotePipeline;
pub use release_notes::{truncate, ReleaseNoteContext, ReleaseNotes, ReleaseNotesGenerator, TRUNCATION_NOTICE};
