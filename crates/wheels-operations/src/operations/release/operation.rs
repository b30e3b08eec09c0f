use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use wheels_pipeline::{CancellationToken, PipelineBuilder, PipelineError};

use super::context::ReleaseContext;
use super::data::{ReleaseData, TagOutcome, VersionBump};
use super::stages::{
    BuildDirtyStage, BumpStage, DetectChangesStage, DiscoverStage, FetchCleanStage,
    PropagateStage, PublishStage, PushStage, TagStage,
};
use crate::traits::{Builder, GitProvider, ManifestWriter, ProjectProvider, ReleaseHost};
use crate::types::ReleaseRequest;
use crate::{OperationError, Result};

#[derive(Debug, Clone)]
pub struct ReleaseOutput {
    pub release: String,
    pub url: Option<String>,
    pub bumps: Vec<VersionBump>,
    pub unchanged: Vec<String>,
    pub tags: Vec<TagOutcome>,
    pub artifacts: Vec<PathBuf>,
    pub commit: Option<String>,
    /// One line per stage with its status marker.
    pub stage_summary: String,
}

impl ReleaseOutput {
    fn from_data(data: ReleaseData, stage_summary: String) -> Self {
        let unchanged = data
            .clean_packages()
            .into_iter()
            .map(|package| package.name.clone())
            .collect();
        let artifacts = data
            .built
            .iter()
            .chain(&data.fetched)
            .map(|artifact| artifact.path.clone())
            .collect();

        Self {
            release: data.discovery.release_name,
            url: data.published.and_then(|published| published.url),
            bumps: data.bumps,
            unchanged,
            tags: data.tags,
            artifacts,
            commit: data.commit.map(|commit| commit.sha),
            stage_summary,
        }
    }
}

pub struct ReleaseOperation<P, G, M, B, H> {
    project_provider: Arc<P>,
    git_provider: Arc<G>,
    manifest_writer: Arc<M>,
    builder: Arc<B>,
    release_host: Arc<H>,
}

impl<P, G, M, B, H> ReleaseOperation<P, G, M, B, H>
where
    P: ProjectProvider + 'static,
    G: GitProvider + 'static,
    M: ManifestWriter + 'static,
    B: Builder + 'static,
    H: ReleaseHost + 'static,
{
    pub fn new(
        project_provider: P,
        git_provider: G,
        manifest_writer: M,
        builder: B,
        release_host: H,
    ) -> Self {
        Self {
            project_provider: Arc::new(project_provider),
            git_provider: Arc::new(git_provider),
            manifest_writer: Arc::new(manifest_writer),
            builder: Arc::new(builder),
            release_host: Arc::new(release_host),
        }
    }

    /// Runs discover, detect, propagate, fetch, build, tag, bump, publish
    /// and push in order.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::StageFailed`] naming the failed stage, the
    /// stages that completed before it and any tags already created. Manifest
    /// edits not yet committed are reverted first; tags are kept.
    #[allow(clippy::items_after_statements)]
    pub fn execute(
        &self,
        request: ReleaseRequest,
        cancel: &CancellationToken,
    ) -> Result<ReleaseOutput> {
        type Discover<P, G, M, B, H> = DiscoverStage<P, G, M, B, H>;
        type Detect<P, G, M, B, H> = DetectChangesStage<P, G, M, B, H>;
        type Propagate<P, G, M, B, H> = PropagateStage<P, G, M, B, H>;
        type Fetch<P, G, M, B, H> = FetchCleanStage<P, G, M, B, H>;
        type Build<P, G, M, B, H> = BuildDirtyStage<P, G, M, B, H>;
        type Tag<P, G, M, B, H> = TagStage<P, G, M, B, H>;
        type Bump<P, G, M, B, H> = BumpStage<P, G, M, B, H>;
        type Publish<P, G, M, B, H> = PublishStage<P, G, M, B, H>;
        type Push<P, G, M, B, H> = PushStage<P, G, M, B, H>;

        let pipeline = PipelineBuilder::new()
            .first_stage(Discover::<P, G, M, B, H>::new())
            .then(Detect::<P, G, M, B, H>::new())
            .then(Propagate::<P, G, M, B, H>::new())
            .then(Fetch::<P, G, M, B, H>::new())
            .then(Build::<P, G, M, B, H>::new())
            .then(Tag::<P, G, M, B, H>::new())
            .then(Bump::<P, G, M, B, H>::new())
            .then(Publish::<P, G, M, B, H>::new())
            .then(Push::<P, G, M, B, H>::new())
            .build();

        let ctx = self.create_context(cancel.clone());
        let (result, audit) = pipeline.run_with_audit(&ctx, request, cancel);

        match result {
            Ok(data) => {
                info!(release = %data.discovery.release_name, "release complete");
                Ok(ReleaseOutput::from_data(data, audit.summary()))
            }
            Err(err) => {
                ctx.restore_manifests();
                Err(Self::stage_error(err, ctx.tags_created()))
            }
        }
    }

    fn create_context(&self, cancel: CancellationToken) -> ReleaseContext<P, G, M, B, H> {
        ReleaseContext::new(
            Arc::clone(&self.project_provider),
            Arc::clone(&self.git_provider),
            Arc::clone(&self.manifest_writer),
            Arc::clone(&self.builder),
            Arc::clone(&self.release_host),
            cancel,
        )
    }

    fn stage_error(
        err: PipelineError<OperationError>,
        tags_created: Vec<String>,
    ) -> OperationError {
        match err {
            PipelineError::StageFailed {
                stage,
                completed,
                source,
            } => OperationError::StageFailed {
                stage,
                completed,
                tags_created,
                source: Box::new(source),
            },
            PipelineError::Cancelled {
                next_stage,
                completed,
            } => OperationError::StageFailed {
                stage: next_stage,
                completed,
                tags_created,
                source: Box::new(OperationError::Cancelled),
            },
            other => OperationError::StageFailed {
                stage: "unknown".to_string(),
                completed: other.completed_stages().to_vec(),
                tags_created,
                source: Box::new(OperationError::Cancelled),
            },
        }
    }
}
