use std::collections::BTreeSet;
use std::fs;
use std::marker::PhantomData;

use tracing::{debug, info, warn};
use wheels_core::{Artifact, PackageInfo};
use wheels_pipeline::Stage;
use wheels_project::MissingArtifactPolicy;

use super::super::context::ReleaseContext;
use super::super::data::ReleaseData;
use super::super::parallel::run_bounded;
use crate::operations::propagate::extend;
use crate::retry::with_backoff;
use crate::traits::{Builder, GitProvider, ManifestWriter, ProjectProvider, ReleaseHost};
use crate::types::{DirtyCause, RemoteArtifact};
use crate::OperationError;

pub struct FetchCleanStage<P, G, M, B, H> {
    _marker: PhantomData<(P, G, M, B, H)>,
}

impl<P, G, M, B, H> FetchCleanStage<P, G, M, B, H> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<P, G, M, B, H> Default for FetchCleanStage<P, G, M, B, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, G, M, B, H> Stage for FetchCleanStage<P, G, M, B, H>
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
        "fetch_clean"
    }

    fn execute(
        &self,
        ctx: &Self::Context,
        mut data: Self::Input,
    ) -> Result<Self::Output, Self::Error> {
        let clean: Vec<PackageInfo> = data.clean_packages().into_iter().cloned().collect();
        let retry = data.config().retry().clone();
        let jobs = data.config().fetch_jobs();

        let lookups = run_bounded(jobs, &clean, ctx.cancel(), |package| {
            with_backoff(&retry, "artifact lookup", || {
                ctx.release_host()
                    .find_artifacts(&package.name, &package.version)
            })
        })?;

        let missing: Vec<&PackageInfo> = clean
            .iter()
            .zip(&lookups)
            .filter(|(_, artifacts)| artifacts.is_empty())
            .map(|(package, _)| package)
            .collect();

        if let Some(first) = missing.first() {
            for package in &missing {
                warn!(package = %package.name, version = %package.version, "no published artifact");
            }

            match data.config().missing_artifact() {
                MissingArtifactPolicy::Fail => {
                    return Err(OperationError::MissingArtifact {
                        package: first.name.clone(),
                        version: first.version.to_string(),
                    });
                }
                MissingArtifactPolicy::Rebuild => {
                    let roots: BTreeSet<String> =
                        missing.iter().map(|package| package.name.clone()).collect();
                    let added = extend(
                        &data.discovery.graph,
                        &mut data.dirty,
                        &roots,
                        &DirtyCause::MissingArtifact,
                    );
                    info!(added = added.len(), "rebuilding packages without artifacts");

                    let republished: Vec<String> = clean
                        .iter()
                        .zip(&lookups)
                        .filter(|(package, artifacts)| {
                            added.contains(&package.name)
                                && !artifacts.is_empty()
                                && !data.is_resume(&package.name)
                        })
                        .map(|(package, _)| format!("{} {}", package.name, package.version))
                        .collect();
                    if !republished.is_empty() {
                        return Err(OperationError::DuplicateVersion {
                            packages: republished,
                        });
                    }
                }
            }
        }

        let dist_dir = data.dist_dir();
        fs::create_dir_all(&dist_dir)?;

        let downloads: Vec<(&PackageInfo, &RemoteArtifact)> = clean
            .iter()
            .zip(&lookups)
            .filter(|(package, _)| !data.dirty.contains(&package.name))
            .flat_map(|(package, artifacts)| {
                artifacts.iter().map(move |artifact| (package, artifact))
            })
            .collect();

        let fetched = run_bounded(jobs, &downloads, ctx.cancel(), |(package, remote)| {
            let path = with_backoff(&retry, "artifact download", || {
                ctx.release_host().download(remote, &dist_dir)
            })?;
            debug!(package = %package.name, file = %remote.file_name, "downloaded artifact");
            Ok(Artifact {
                package: package.name.clone(),
                version: package.version.clone(),
                path,
            })
        })?;

        info!(artifacts = fetched.len(), "fetched clean package artifacts");
        data.fetched = fetched;
        Ok(data)
    }
}
