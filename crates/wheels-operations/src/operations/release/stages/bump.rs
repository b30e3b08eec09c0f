use std::collections::BTreeMap;
use std::marker::PhantomData;

use semver::Version;
use tracing::debug;
use wheels_pipeline::Stage;
use wheels_version::{bump_patch, ensure_patch_increase};

use super::super::context::ReleaseContext;
use super::super::data::{ReleaseData, VersionBump};
use crate::traits::{Builder, GitProvider, ManifestWriter, ProjectProvider, ReleaseHost};
use crate::OperationError;

pub struct BumpStage<P, G, M, B, H> {
    _marker: PhantomData<(P, G, M, B, H)>,
}

impl<P, G, M, B, H> BumpStage<P, G, M, B, H> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<P, G, M, B, H> Default for BumpStage<P, G, M, B, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, G, M, B, H> Stage for BumpStage<P, G, M, B, H>
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
        "bump"
    }

    fn execute(
        &self,
        ctx: &Self::Context,
        mut data: Self::Input,
    ) -> Result<Self::Output, Self::Error> {
        let writer = ctx.manifest_writer();

        let next: BTreeMap<String, Version> = data
            .dirty_packages()
            .into_iter()
            .map(|package| (package.name.clone(), bump_patch(&package.version)))
            .collect();

        let mut bumps = Vec::with_capacity(next.len());
        for package in data.dirty_packages() {
            let Some(new) = next.get(&package.name) else {
                continue;
            };
            ensure_patch_increase(&package.version, new)?;

            let manifest_path = package.manifest_path();
            ctx.preserve_manifest(&manifest_path)?;
            writer.write_version(&manifest_path, new)?;

            let pins: BTreeMap<String, Version> = data
                .graph()
                .dependencies_of(&package.name)
                .filter_map(|dependency| {
                    next.get(dependency)
                        .map(|version| (dependency.to_string(), version.clone()))
                })
                .collect();
            if !pins.is_empty() {
                writer.write_dependency_pins(&manifest_path, &pins)?;
            }

            writer.verify_version(&manifest_path, new)?;
            debug!(package = %package.name, old = %package.version, %new, "bumped version");

            bumps.push(VersionBump {
                package: package.name.clone(),
                manifest_path,
                old: package.version.clone(),
                new: new.clone(),
            });
        }

        data.bumps = bumps;
        Ok(data)
    }
}
