mod context;
mod data;
mod notes;
mod operation;
mod parallel;
pub mod stages;

pub use context::ReleaseContext;
pub use data::{ReleaseData, TagOutcome, VersionBump};
pub use notes::{bump_commit_message, release_notes};
pub use operation::{ReleaseOperation, ReleaseOutput};
