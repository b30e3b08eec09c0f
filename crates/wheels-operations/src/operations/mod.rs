mod detect;
mod discovery;
mod plan;
mod propagate;
mod release;

pub use detect::{ChangeDetector, LastRelease};
pub use discovery::{Discovery, discover};
pub use plan::{PlanOperation, PlanOutput};
pub use propagate::{extend, propagate};
pub use release::{
    ReleaseContext, ReleaseData, ReleaseOperation, ReleaseOutput, TagOutcome, VersionBump,
    bump_commit_message, release_notes, stages,
};
