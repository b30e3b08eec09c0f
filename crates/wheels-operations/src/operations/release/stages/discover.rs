use std::marker::PhantomData;

use tracing::{debug, info};
use wheels_pipeline::Stage;

use super::super::context::ReleaseContext;
use super::super::data::ReleaseData;
use crate::operations::discovery::discover;
use crate::traits::{Builder, GitProvider, ManifestWriter, ProjectProvider, ReleaseHost};
use crate::types::ReleaseRequest;
use crate::OperationError;

pub struct DiscoverStage<P, G, M, B, H> {
    _marker: PhantomData<(P, G, M, B, H)>,
}

impl<P, G, M, B, H> DiscoverStage<P, G, M, B, H> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<P, G, M, B, H> Default for DiscoverStage<P, G, M, B, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, G, M, B, H> Stage for DiscoverStage<P, G, M, B, H>
where
    P: ProjectProvider + 'static,
    G: GitProvider + 'static,
    M: ManifestWriter + 'static,
    B: Builder + 'static,
    H: ReleaseHost + 'static,
{
    type Input = ReleaseRequest;
    type Output = ReleaseData;
    type Context = ReleaseContext<P, G, M, B, H>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "discover"
    }

    fn execute(
        &self,
        ctx: &Self::Context,
        request: Self::Input,
    ) -> Result<Self::Output, Self::Error> {
        let discovery = discover(ctx.project_provider(), ctx.git_provider(), &request)?;
        let root = &discovery.workspace.root;

        if !request.allow_dirty && !ctx.git_provider().is_working_tree_clean(root)? {
            return Err(OperationError::DirtyWorkingTree);
        }

        let git = ctx.git_provider();
        let branch = git.current_branch(root)?;
        info!(%branch, head = %discovery.head_sha, "releasing from branch");

        // The host release targets HEAD by SHA before anything is pushed.
        let remote = discovery.config.remote();
        if let Some(tip) = git.remote_branch_sha(root, remote, &branch)? {
            if !git.is_ancestor(root, &discovery.head_sha, &tip)? {
                return Err(OperationError::HeadNotPushed {
                    head: discovery.head_sha.clone(),
                    remote: remote.to_string(),
                    branch,
                });
            }
        } else {
            debug!(remote, %branch, "no remote-tracking branch, assuming HEAD is pushed");
        }

        Ok(ReleaseData::new(discovery, request.force_all, branch))
    }
}
