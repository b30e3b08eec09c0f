use std::any::Any;

use crate::stage::Stage;

pub(crate) type ErasedValue = Box<dyn Any + Send>;

pub(crate) trait ErasedStage<Ctx, Err> {
    fn name(&self) -> &'static str;

    fn execute_erased(&self, ctx: &Ctx, input: ErasedValue) -> Result<ErasedValue, Err>;
}

pub(crate) struct StageWrapper<S> {
    stage: S,
}

impl<S> StageWrapper<S> {
    pub(crate) fn new(stage: S) -> Self {
        Self { stage }
    }
}

impl<S> ErasedStage<S::Context, S::Error> for StageWrapper<S>
where
    S: Stage,
{
    fn name(&self) -> &'static str {
        self.stage.name()
    }

    fn execute_erased(
        &self,
        ctx: &S::Context,
        input: ErasedValue,
    ) -> Result<ErasedValue, S::Error> {
        let typed_input = input
            .downcast::<S::Input>()
            .expect("type-state builder guarantees correct input type");
        let output = self.stage.execute(ctx, *typed_input)?;
        Ok(Box::new(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestContext {
        multiplier: i32,
    }

    #[derive(Debug, PartialEq)]
    struct TestError(String);

    struct MultiplyStage;

    impl Stage for MultiplyStage {
        type Input = i32;
        type Output = i32;
        type Context = TestContext;
        type Error = TestError;

        fn name(&self) -> &'static str {
            "multiply"
        }

        fn execute(
            &self,
            ctx: &Self::Context,
            input: Self::Input,
        ) -> Result<Self::Output, Self::Error> {
            Ok(input * ctx.multiplier)
        }
    }

    struct FailingStage;

    impl Stage for FailingStage {
        type Input = String;
        type Output = ();
        type Context = TestContext;
        type Error = TestError;

        fn name(&self) -> &'static str {
            "failing"
        }

        fn execute(
            &self,
            _ctx: &Self::Context,
            input: Self::Input,
        ) -> Result<Self::Output, Self::Error> {
            Err(TestError(input))
        }
    }

    #[test]
    fn wrapper_delegates_name() {
        let wrapper = StageWrapper::new(MultiplyStage);
        assert_eq!(wrapper.name(), "multiply");
    }

    #[test]
    fn wrapper_executes_with_erased_types() {
        let ctx = TestContext { multiplier: 3 };
        let wrapper = StageWrapper::new(MultiplyStage);

        let output = wrapper
            .execute_erased(&ctx, Box::new(7_i32))
            .expect("execution should succeed")
            .downcast::<i32>()
            .expect("output should be i32");

        assert_eq!(*output, 21);
    }

    #[test]
    fn wrapper_propagates_errors() {
        let ctx = TestContext { multiplier: 1 };
        let wrapper = StageWrapper::new(FailingStage);

        let result = wrapper.execute_erased(&ctx, Box::new(String::from("boom")));

        assert_eq!(
            result.err().expect("should fail"),
            TestError("boom".to_string())
        );
    }
}
