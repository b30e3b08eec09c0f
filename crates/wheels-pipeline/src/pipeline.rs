use std::fmt::Debug;
use std::marker::PhantomData;

use tracing::{debug, info, warn};

use crate::audit::PipelineAuditLog;
use crate::cancel::CancellationToken;
use crate::erased::{ErasedStage, ErasedValue};
use crate::error::PipelineError;

/// A compiled pipeline ready for execution.
///
/// Stages run in order and each stage's output becomes the next stage's
/// input. A failing stage stops the run; stages that already completed are
/// reported but not undone.
pub struct Pipeline<Input, Output, Ctx, Err> {
    stages: Vec<Box<dyn ErasedStage<Ctx, Err>>>,
    _phantom: PhantomData<(Input, Output)>,
}

impl<Input, Output, Ctx, Err> Pipeline<Input, Output, Ctx, Err>
where
    Input: Send + 'static,
    Output: Send + 'static,
    Err: Debug,
{
    pub(crate) fn from_stages(stages: Vec<Box<dyn ErasedStage<Ctx, Err>>>) -> Self {
        Self {
            stages,
            _phantom: PhantomData,
        }
    }

    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Run every stage in order.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::StageFailed` when a stage fails and
    /// `PipelineError::Cancelled` when `cancel` is set before a stage starts.
    pub fn run(
        &self,
        ctx: &Ctx,
        input: Input,
        cancel: &CancellationToken,
    ) -> Result<Output, PipelineError<Err>> {
        let (result, _audit_log) = self.run_internal(ctx, input, cancel);
        result
    }

    /// Run every stage and return the result together with an audit log.
    pub fn run_with_audit(
        &self,
        ctx: &Ctx,
        input: Input,
        cancel: &CancellationToken,
    ) -> (Result<Output, PipelineError<Err>>, PipelineAuditLog) {
        self.run_internal(ctx, input, cancel)
    }

    fn run_internal(
        &self,
        ctx: &Ctx,
        input: Input,
        cancel: &CancellationToken,
    ) -> (Result<Output, PipelineError<Err>>, PipelineAuditLog) {
        let mut audit_log = PipelineAuditLog::new();
        let mut completed: Vec<String> = Vec::new();
        let mut current: ErasedValue = Box::new(input);

        for stage in &self.stages {
            let name = stage.name();

            if cancel.is_cancelled() {
                warn!(stage = name, "cancellation requested, stopping");
                audit_log.record_cancelled(name);
                return (
                    Err(PipelineError::Cancelled {
                        next_stage: name.to_string(),
                        completed,
                    }),
                    audit_log,
                );
            }

            info!(stage = name, "starting stage");
            audit_log.record_start(name);

            match stage.execute_erased(ctx, current) {
                Ok(output) => {
                    audit_log.record_success();
                    debug!(stage = name, "stage completed");
                    completed.push(name.to_string());
                    current = output;
                }
                Err(source) => {
                    audit_log.record_failure();
                    warn!(stage = name, ?source, "stage failed");
                    return (
                        Err(PipelineError::StageFailed {
                            stage: name.to_string(),
                            completed,
                            source,
                        }),
                        audit_log,
                    );
                }
            }
        }

        let output = current
            .downcast::<Output>()
            .expect("type-state builder guarantees final output type");
        (Ok(*output), audit_log)
    }
}
