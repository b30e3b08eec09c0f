use std::path::PathBuf;

use thiserror::Error;
use wheels_operations::OperationError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error("failed to determine current directory")]
    CurrentDir(#[source] std::io::Error),

    #[error("failed to write step outputs to '{}'", path.display())]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to install interrupt handler")]
    InterruptHandler(#[from] ctrlc::Error),
}

impl CliError {
    /// The operation error behind this failure, if any.
    pub(crate) fn operation(&self) -> Option<&OperationError> {
        match self {
            Self::Operation(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
