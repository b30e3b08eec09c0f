use std::fmt::Debug;
use std::marker::PhantomData;

use crate::erased::{ErasedStage, StageWrapper};
use crate::pipeline::Pipeline;
use crate::stage::Stage;

/// Marker type for a builder with no stages.
pub struct Empty;

/// Marker type for a builder with at least one stage.
pub struct HasStages<LastOutput>(PhantomData<LastOutput>);

/// Type-state builder for pipelines.
///
/// Each stage's input type must match the previous stage's output type, and
/// an empty pipeline cannot be built:
///
/// ```compile_fail
/// use wheels_pipeline::{PipelineBuilder, Stage};
///
/// struct ToText;
/// impl Stage for ToText {
///     type Input = i32;
///     type Output = String;
///     type Context = ();
///     type Error = ();
///     fn name(&self) -> &'static str { "to_text" }
///     fn execute(&self, _: &(), input: i32) -> Result<String, ()> {
///         Ok(input.to_string())
///     }
/// }
///
/// struct Double;
/// impl Stage for Double {
///     type Input = i32;
///     type Output = i32;
///     type Context = ();
///     type Error = ();
///     fn name(&self) -> &'static str { "double" }
///     fn execute(&self, _: &(), input: i32) -> Result<i32, ()> {
///         Ok(input * 2)
///     }
/// }
///
/// let pipeline = PipelineBuilder::new()
///     .first_stage(ToText)
///     .then(Double)
///     .build();
/// ```
pub struct PipelineBuilder<Input, Output, Ctx, Err, State> {
    stages: Vec<Box<dyn ErasedStage<Ctx, Err>>>,
    _phantom: PhantomData<(Input, Output, State)>,
}

impl<Ctx, Err> PipelineBuilder<(), (), Ctx, Err, Empty> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            _phantom: PhantomData,
        }
    }

    /// Add the first stage, fixing the pipeline's input type.
    #[must_use]
    pub fn first_stage<S>(
        self,
        stage: S,
    ) -> PipelineBuilder<S::Input, S::Output, Ctx, Err, HasStages<S::Output>>
    where
        S: Stage<Context = Ctx, Error = Err> + 'static,
    {
        let mut stages = self.stages;
        stages.push(Box::new(StageWrapper::new(stage)));
        PipelineBuilder {
            stages,
            _phantom: PhantomData,
        }
    }
}

impl<Ctx, Err> Default for PipelineBuilder<(), (), Ctx, Err, Empty> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Input, CurrentOutput, Ctx, Err>
    PipelineBuilder<Input, CurrentOutput, Ctx, Err, HasStages<CurrentOutput>>
{
    #[must_use]
    pub fn then<S>(
        self,
        stage: S,
    ) -> PipelineBuilder<Input, S::Output, Ctx, Err, HasStages<S::Output>>
    where
        S: Stage<Input = CurrentOutput, Context = Ctx, Error = Err> + 'static,
    {
        let mut stages = self.stages;
        stages.push(Box::new(StageWrapper::new(stage)));
        PipelineBuilder {
            stages,
            _phantom: PhantomData,
        }
    }

    #[must_use]
    pub fn build(self) -> Pipeline<Input, CurrentOutput, Ctx, Err>
    where
        Input: Send + 'static,
        CurrentOutput: Send + 'static,
        Err: Debug,
    {
        Pipeline::from_stages(self.stages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestContext;

    #[derive(Debug)]
    struct TestError;

    struct IntToString;

    impl Stage for IntToString {
        type Input = i32;
        type Output = String;
        type Context = TestContext;
        type Error = TestError;

        fn name(&self) -> &'static str {
            "int_to_string"
        }

        fn execute(
            &self,
            _ctx: &Self::Context,
            input: Self::Input,
        ) -> Result<Self::Output, Self::Error> {
            Ok(input.to_string())
        }
    }

    struct StringToLen;

    impl Stage for StringToLen {
        type Input = String;
        type Output = usize;
        type Context = TestContext;
        type Error = TestError;

        fn name(&self) -> &'static str {
            "string_to_len"
        }

        fn execute(
            &self,
            _ctx: &Self::Context,
            input: Self::Input,
        ) -> Result<Self::Output, Self::Error> {
            Ok(input.len())
        }
    }

    #[test]
    fn builder_creates_single_stage_pipeline() {
        let pipeline: Pipeline<i32, String, TestContext, TestError> =
            PipelineBuilder::new().first_stage(IntToString).build();

        assert_eq!(pipeline.stage_names(), vec!["int_to_string"]);
    }

    #[test]
    fn builder_chains_stages_in_order() {
        let pipeline: Pipeline<i32, usize, TestContext, TestError> = PipelineBuilder::new()
            .first_stage(IntToString)
            .then(StringToLen)
            .build();

        assert_eq!(pipeline.stage_names(), vec!["int_to_string", "string_to_len"]);
    }
}
