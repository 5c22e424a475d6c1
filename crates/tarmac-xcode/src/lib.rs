//! Tarmac Xcode - Archive, export and symbol upload
//!
//! Drives `xcodebuild` and `ditto` to turn a release type into a signed
//! archive, zipped debug symbols and, for exportable channels, an IPA. Every
//! produced file is recorded in the run's artifact tracker.

pub mod export_options;
pub mod layout;
pub mod orchestration;
pub mod xcodebuild;

pub use export_options::ExportOptions;
pub use layout::OutputLayout;
pub use orchestration::{BuildOptions, BuildOrchestrator, BuildOutcome, BuildState};
