mod error;
pub mod operations;
pub mod providers;
pub mod retry;
pub mod traits;
mod types;

#[cfg(test)]
pub(crate) mod mocks;

pub use error::{OperationError, Result};
pub use types::{
    ChangeReason, ChangeRecord, DirtyCause, DirtySet, PublishedRelease, ReleaseRequest,
    RemoteArtifact,
};
