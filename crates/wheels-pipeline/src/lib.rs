//! Typed stage pipeline for long-running, non-reversible workflows.
//!
//! Each stage's output becomes the next stage's input. Completed stages are
//! checkpoints: a failure stops the run and reports which stages finished,
//! but nothing is rolled back. Cancellation is honored between stages.

mod audit;
mod builder;
mod cancel;
mod erased;
mod error;
mod pipeline;
mod stage;

pub use audit::{PipelineAuditLog, StageRecord, StageStatus};
pub use builder::PipelineBuilder;
pub use cancel::CancellationToken;
pub use error::PipelineError;
pub use pipeline::Pipeline;
pub use stage::Stage;
