use std::fmt::Debug;

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PipelineError<E: Debug> {
    /// A stage failed. Stages listed in `completed` keep their effects.
    #[error("stage '{stage}' failed")]
    StageFailed {
        stage: String,
        completed: Vec<String>,
        #[source]
        source: E,
    },

    /// The run was cancelled before `next_stage` started.
    #[error("cancelled before stage '{next_stage}'")]
    Cancelled {
        next_stage: String,
        completed: Vec<String>,
    },
}

impl<E: Debug> PipelineError<E> {
    /// Names of the stages that finished before the run stopped.
    #[must_use]
    pub fn completed_stages(&self) -> &[String] {
        match self {
            Self::StageFailed { completed, .. } | Self::Cancelled { completed, .. } => completed,
        }
    }
}
