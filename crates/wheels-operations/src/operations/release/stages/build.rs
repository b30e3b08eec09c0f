use std::collections::BTreeMap;
use std::fs;
use std::marker::PhantomData;
use std::path::Path;

use semver::Version;
use tracing::{debug, info};
use wheels_core::{Artifact, PackageInfo};
use wheels_pipeline::Stage;
use wheels_version::bump_patch;

use super::super::context::ReleaseContext;
use super::super::data::ReleaseData;
use super::super::parallel::run_bounded;
use crate::retry::with_backoff;
use crate::traits::{Builder, GitProvider, ManifestWriter, ProjectProvider, ReleaseHost};
use crate::{OperationError, Result};

pub struct BuildDirtyStage<P, G, M, B, H> {
    _marker: PhantomData<(P, G, M, B, H)>,
}

impl<P, G, M, B, H> BuildDirtyStage<P, G, M, B, H> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<P, G, M, B, H> Default for BuildDirtyStage<P, G, M, B, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, G, M, B, H> Stage for BuildDirtyStage<P, G, M, B, H>
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
        "build_dirty"
    }

    fn execute(
        &self,
        ctx: &Self::Context,
        mut data: Self::Input,
    ) -> Result<Self::Output> {
        let levels = data.graph().levels(&data.dirty.to_set());
        data.build_order = levels.iter().flatten().cloned().collect();

        let dist_dir = data.dist_dir();
        fs::create_dir_all(&dist_dir)?;

        let mut built = Vec::new();
        for (index, level) in levels.iter().enumerate() {
            if ctx.cancel().is_cancelled() {
                return Err(OperationError::Cancelled);
            }

            let packages: Vec<&PackageInfo> = level
                .iter()
                .filter_map(|name| data.graph().package(name))
                .collect();

            for package in &packages {
                let pins = build_pins(&data, &package.name);
                if !pins.is_empty() {
                    let manifest_path = package.manifest_path();
                    ctx.preserve_manifest(&manifest_path)?;
                    let written = ctx
                        .manifest_writer()
                        .write_dependency_pins(&manifest_path, &pins)?;
                    debug!(package = %package.name, pins = written, "pinned internal dependencies");
                }
            }

            info!(level = index, packages = ?level, "building level");
            let artifacts = run_bounded(
                data.config().build_jobs(),
                &packages,
                ctx.cancel(),
                |package| build_or_reuse(ctx, &data, package, &dist_dir),
            )?;
            built.extend(artifacts.into_iter().flatten());
        }

        info!(artifacts = built.len(), "built dirty packages");
        data.built = built;
        Ok(data)
    }
}

/// Pins for every internal dependency of `name`: dirty dependencies at the
/// version they will carry after this release, clean ones at their current
/// version.
fn build_pins(data: &ReleaseData, name: &str) -> BTreeMap<String, Version> {
    data.graph()
        .dependencies_of(name)
        .filter_map(|dependency| data.graph().package(dependency))
        .map(|dependency| {
            let version = if data.dirty.contains(&dependency.name) {
                bump_patch(&dependency.version)
            } else {
                dependency.version.clone()
            };
            (dependency.name.clone(), version)
        })
        .collect()
}

/// Packages already tagged at HEAD by an interrupted run reuse whatever the
/// host has for them; everything else is built.
fn build_or_reuse<P, G, M, B, H>(
    ctx: &ReleaseContext<P, G, M, B, H>,
    data: &ReleaseData,
    package: &PackageInfo,
    dist_dir: &Path,
) -> Result<Vec<Artifact>>
where
    P: ProjectProvider,
    G: GitProvider,
    M: ManifestWriter,
    B: Builder,
    H: ReleaseHost,
{
    if data.is_resume(&package.name) {
        let retry = data.config().retry();
        let remote = with_backoff(retry, "artifact lookup", || {
            ctx.release_host()
                .find_artifacts(&package.name, &package.version)
        })?;

        if !remote.is_empty() {
            info!(package = %package.name, "reusing artifacts published by an earlier run");
            return remote
                .iter()
                .map(|artifact| {
                    let path = with_backoff(retry, "artifact download", || {
                        ctx.release_host().download(artifact, dist_dir)
                    })?;
                    Ok(Artifact {
                        package: package.name.clone(),
                        version: package.version.clone(),
                        path,
                    })
                })
                .collect();
        }
    }

    info!(package = %package.name, version = %package.version, "building");
    ctx.builder()
        .build(package, dist_dir)
        .map_err(|source| OperationError::Build {
            package: package.name.clone(),
            source: Box::new(source),
        })
}
