use std::collections::BTreeSet;
use std::marker::PhantomData;

use tracing::{info, warn};
use wheels_core::PackageInfo;
use wheels_pipeline::Stage;

use super::super::context::ReleaseContext;
use super::super::data::ReleaseData;
use super::super::parallel::run_bounded;
use crate::operations::propagate::propagate;
use crate::retry::with_backoff;
use crate::traits::{Builder, GitProvider, ManifestWriter, ProjectProvider, ReleaseHost};
use crate::{OperationError, Result};

pub struct PropagateStage<P, G, M, B, H> {
    _marker: PhantomData<(P, G, M, B, H)>,
}

impl<P, G, M, B, H> PropagateStage<P, G, M, B, H> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<P, G, M, B, H> Default for PropagateStage<P, G, M, B, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, G, M, B, H> Stage for PropagateStage<P, G, M, B, H>
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
        "propagate"
    }

    fn execute(
        &self,
        ctx: &Self::Context,
        mut data: Self::Input,
    ) -> Result<Self::Output> {
        let directly_changed: BTreeSet<String> = data
            .records
            .values()
            .filter(|record| record.changed_directly)
            .map(|record| record.package.clone())
            .collect();

        data.dirty = propagate(data.graph(), &directly_changed, data.force_all);
        if data.dirty.is_empty() {
            return Err(OperationError::NothingToRelease);
        }

        info!(
            dirty = data.dirty.len(),
            clean = data.graph().len() - data.dirty.len(),
            "computed dirty set"
        );

        let candidates: Vec<&PackageInfo> = data
            .graph()
            .packages()
            .filter(|package| data.dirty.contains(&package.name) && !data.is_resume(&package.name))
            .collect();
        ensure_unpublished(ctx, &data, &candidates)?;

        Ok(data)
    }
}

/// Fails with [`OperationError::DuplicateVersion`] if the host already has
/// artifacts for the current version of any of `packages`.
pub(super) fn ensure_unpublished<P, G, M, B, H>(
    ctx: &ReleaseContext<P, G, M, B, H>,
    data: &ReleaseData,
    packages: &[&PackageInfo],
) -> Result<()>
where
    P: ProjectProvider,
    G: GitProvider,
    M: ManifestWriter,
    B: Builder,
    H: ReleaseHost,
{
    let retry = data.config().retry();
    let found = run_bounded(data.config().fetch_jobs(), packages, ctx.cancel(), |package| {
        with_backoff(retry, "artifact lookup", || {
            ctx.release_host()
                .find_artifacts(&package.name, &package.version)
        })
    })?;

    let duplicates: Vec<String> = packages
        .iter()
        .zip(found)
        .filter(|(_, artifacts)| !artifacts.is_empty())
        .map(|(package, artifacts)| {
            warn!(
                package = %package.name,
                version = %package.version,
                release = artifacts.first().map_or("", |artifact| artifact.release.as_str()),
                "version already published"
            );
            format!("{} {}", package.name, package.version)
        })
        .collect();

    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(OperationError::DuplicateVersion {
            packages: duplicates,
        })
    }
}
