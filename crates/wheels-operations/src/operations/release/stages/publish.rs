use std::marker::PhantomData;

use tracing::info;
use wheels_core::PackageInfo;
use wheels_pipeline::Stage;

use super::super::context::ReleaseContext;
use super::super::data::ReleaseData;
use super::super::notes::release_notes;
use crate::retry::with_backoff;
use crate::traits::{
    Builder, GitProvider, ManifestWriter, ProjectProvider, ReleaseHost, ReleaseSpec,
};
use crate::OperationError;

pub struct PublishStage<P, G, M, B, H> {
    _marker: PhantomData<(P, G, M, B, H)>,
}

impl<P, G, M, B, H> PublishStage<P, G, M, B, H> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<P, G, M, B, H> Default for PublishStage<P, G, M, B, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, G, M, B, H> Stage for PublishStage<P, G, M, B, H>
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
        "publish"
    }

    fn execute(
        &self,
        ctx: &Self::Context,
        mut data: Self::Input,
    ) -> Result<Self::Output, Self::Error> {
        let released: Vec<&PackageInfo> = data.dirty_packages();
        let unchanged: Vec<&str> = data
            .clean_packages()
            .into_iter()
            .map(|package| package.name.as_str())
            .collect();

        let mut artifacts: Vec<_> = data
            .built
            .iter()
            .chain(&data.fetched)
            .map(|artifact| artifact.path.clone())
            .collect();
        artifacts.sort();

        let release = &data.discovery.release_name;
        let spec = ReleaseSpec {
            name: release.clone(),
            target_commit: data.head().to_string(),
            title: format!("Release {release}"),
            notes: release_notes(&released, &unchanged),
            artifacts,
            tags: data.tag_names(),
        };

        info!(release = %spec.name, artifacts = spec.artifacts.len(), "creating release");
        let published = with_backoff(data.config().retry(), "release creation", || {
            ctx.release_host().create_release(&spec)
        })?;
        if let Some(url) = &published.url {
            info!(%url, "release published");
        }

        data.published = Some(published);
        Ok(data)
    }
}
