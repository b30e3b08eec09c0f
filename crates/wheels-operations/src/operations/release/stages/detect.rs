use std::marker::PhantomData;

use wheels_pipeline::Stage;

use super::super::context::ReleaseContext;
use super::super::data::ReleaseData;
use crate::operations::detect::ChangeDetector;
use crate::traits::{Builder, GitProvider, ManifestWriter, ProjectProvider, ReleaseHost};
use crate::OperationError;

pub struct DetectChangesStage<P, G, M, B, H> {
    _marker: PhantomData<(P, G, M, B, H)>,
}

impl<P, G, M, B, H> DetectChangesStage<P, G, M, B, H> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<P, G, M, B, H> Default for DetectChangesStage<P, G, M, B, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, G, M, B, H> Stage for DetectChangesStage<P, G, M, B, H>
where
    P: ProjectProvider + 'static,
    G: GitProvider + 'static,
    M: ManifestWriter + 'static,
    B: Builder + 'static,
    H: ReleaseHost + 'static,
{
    type Input = ReleaseData;
    type Output = ReleaseData;
    type Context = ReleaseContext<P, G, M, B, H>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "detect_changes"
    }

    fn execute(
        &self,
        ctx: &Self::Context,
        mut data: Self::Input,
    ) -> Result<Self::Output, Self::Error> {
        let records = {
            let detector = ChangeDetector::new(ctx.git_provider(), data.root(), data.config())?;
            detector.detect_all(&data.discovery.packages(), data.force_all)?
        };
        data.records = records;
        Ok(data)
    }
}
