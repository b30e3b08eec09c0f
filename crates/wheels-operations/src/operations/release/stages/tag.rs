use std::marker::PhantomData;

use tracing::info;
use wheels_core::PackageTag;
use wheels_pipeline::Stage;

use super::super::context::ReleaseContext;
use super::super::data::{ReleaseData, TagOutcome};
use crate::traits::{Builder, GitProvider, ManifestWriter, ProjectProvider, ReleaseHost};
use crate::types::DirtyCause;
use crate::OperationError;

pub struct TagStage<P, G, M, B, H> {
    _marker: PhantomData<(P, G, M, B, H)>,
}

impl<P, G, M, B, H> TagStage<P, G, M, B, H> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<P, G, M, B, H> Default for TagStage<P, G, M, B, H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, G, M, B, H> Stage for TagStage<P, G, M, B, H>
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
        "tag"
    }

    fn execute(
        &self,
        ctx: &Self::Context,
        mut data: Self::Input,
    ) -> Result<Self::Output, Self::Error> {
        let git = ctx.git_provider();
        let head = data.head().to_string();

        // Every conflict is found before the first tag is written.
        let mut planned = Vec::new();
        for package in data.dirty_packages() {
            let tag = PackageTag::new(package.name.clone(), package.version.clone());
            let name = tag.to_string();
            let exists = match git.find_tag(data.root(), &name)? {
                Some(existing) if existing.target_sha == head => true,
                // Rebuilt only to restore lost artifacts; the tag marks the
                // original release of this version.
                Some(_)
                    if data.dirty.cause(&package.name) == Some(&DirtyCause::MissingArtifact) =>
                {
                    true
                }
                Some(existing) => {
                    return Err(OperationError::TagConflict {
                        tag: name,
                        existing: existing.target_sha,
                        expected: head,
                    });
                }
                None => false,
            };
            planned.push((tag, exists));
        }

        let mut outcomes = Vec::with_capacity(planned.len());
        for (tag, exists) in planned {
            let name = tag.to_string();
            if exists {
                info!(tag = %name, "tag already exists, keeping it");
            } else {
                let message = format!("Release {} {}", tag.package, tag.version);
                git.create_tag(data.root(), &name, &head, &message)?;
                ctx.record_tag(&name);
                info!(tag = %name, "created tag");
            }
            outcomes.push(TagOutcome {
                name,
                created: !exists,
            });
        }

        data.tags = outcomes;
        Ok(data)
    }
}
