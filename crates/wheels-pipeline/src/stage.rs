/// A stage of a pipeline.
///
/// # Type Parameters
///
/// - `Input`: Data received from the previous stage (or pipeline entry point)
/// - `Output`: Data produced for the next stage
/// - `Context`: Shared dependencies (injected, not passed between stages)
/// - `Error`: The error type for stage failures
pub trait Stage {
    type Input: Send + 'static;

    type Output: Send + 'static;

    type Context;

    type Error;

    /// Human-readable name for logging and error messages.
    fn name(&self) -> &'static str;

    /// # Errors
    ///
    /// Returns an error if the stage fails to complete. Side effects already
    /// performed by the stage are left in place.
    fn execute(&self, ctx: &Self::Context, input: Self::Input)
    -> Result<Self::Output, Self::Error>;
}
