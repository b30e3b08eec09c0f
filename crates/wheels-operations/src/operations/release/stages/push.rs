use std::marker::PhantomData;
use std::path::Path;

use tracing::info;
use wheels_pipeline::Stage;

use super::super::context::ReleaseContext;
use super::super::data::ReleaseData;
use super::super::notes::bump_commit_message;
use crate::traits::{Builder, GitProvider, ManifestWriter, ProjectProvider, ReleaseHost};
use crate::OperationError;

pub struct PushStage<P, G, M, B, H> {
    _marker: PhantomData<(P, G, M, B, H)>,
}

impl<P, G, M, B, H> PushStage<P, G, M, B, H> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<P, G, M, B, H> Default for PushStage<P, G, M, B, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, G, M, B, H> Stage for PushStage<P, G, M, B, H>
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
        "push"
    }

    fn execute(
        &self,
        ctx: &Self::Context,
        mut data: Self::Input,
    ) -> Result<Self::Output, Self::Error> {
        let git = ctx.git_provider();

        let manifests: Vec<&Path> = data
            .bumps
            .iter()
            .map(|bump| bump.manifest_path.as_path())
            .collect();
        git.stage_files(data.root(), &manifests)?;

        let message = bump_commit_message(data.config().commit_message(), &data.bumps);
        let commit = git.commit(data.root(), &message)?;
        ctx.forget_manifests();
        info!(sha = %commit.sha, "committed version bumps");

        let tags = data.tag_names();
        git.push(data.root(), data.config().remote(), &data.branch, &tags)?;
        info!(remote = data.config().remote(), branch = %data.branch, tags = tags.len(), "pushed");

        data.commit = Some(commit);
        Ok(data)
    }
}
