use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{error, info};
use wheels_pipeline::CancellationToken;

use crate::Result;
use crate::traits::{Builder, GitProvider, ManifestWriter, ProjectProvider, ReleaseHost};

/// Collaborators shared by every release stage.
pub struct ReleaseContext<P, G, M, B, H> {
    project_provider: Arc<P>,
    git_provider: Arc<G>,
    manifest_writer: Arc<M>,
    builder: Arc<B>,
    release_host: Arc<H>,
    cancel: CancellationToken,
    tags_created: Mutex<Vec<String>>,
    /// Manifest contents from before this run first edited them.
    originals: Mutex<BTreeMap<PathBuf, String>>,
}

impl<P, G, M, B, H> ReleaseContext<P, G, M, B, H>
where
    P: ProjectProvider,
    G: GitProvider,
    M: ManifestWriter,
    B: Builder,
    H: ReleaseHost,
{
    pub fn new(
        project_provider: Arc<P>,
        git_provider: Arc<G>,
        manifest_writer: Arc<M>,
        builder: Arc<B>,
        release_host: Arc<H>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            project_provider,
            git_provider,
            manifest_writer,
            builder,
            release_host,
            cancel,
            tags_created: Mutex::new(Vec::new()),
            originals: Mutex::new(BTreeMap::new()),
        }
    }

    #[must_use]
    pub fn project_provider(&self) -> &P {
        &self.project_provider
    }

    #[must_use]
    pub fn git_provider(&self) -> &G {
        &self.git_provider
    }

    #[must_use]
    pub fn manifest_writer(&self) -> &M {
        &self.manifest_writer
    }

    #[must_use]
    pub fn builder(&self) -> &B {
        &self.builder
    }

    #[must_use]
    pub fn release_host(&self) -> &H {
        &self.release_host
    }

    #[must_use]
    pub fn cancel(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Remembers a tag created during this run so a later failure can
    /// report it.
    pub fn record_tag(&self, name: &str) {
        self.tags_created
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(name.to_string());
    }

    #[must_use]
    pub fn tags_created(&self) -> Vec<String> {
        self.tags_created
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Keeps the contents of `manifest_path` unless an earlier edit in this
    /// run already did. Must be called before every manifest write.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be read.
    pub fn preserve_manifest(&self, manifest_path: &Path) -> Result<()> {
        let mut originals = self.originals.lock().unwrap_or_else(PoisonError::into_inner);
        if !originals.contains_key(manifest_path) {
            let contents = self.manifest_writer.snapshot(manifest_path)?;
            originals.insert(manifest_path.to_path_buf(), contents);
        }
        Ok(())
    }

    /// Called once the edits are committed; there is nothing left to undo.
    pub fn forget_manifests(&self) {
        self.originals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Writes every preserved manifest back. Returns the paths restored.
    /// A manifest that cannot be written is logged and skipped so the rest
    /// are still restored.
    pub fn restore_manifests(&self) -> Vec<PathBuf> {
        let originals =
            std::mem::take(&mut *self.originals.lock().unwrap_or_else(PoisonError::into_inner));

        let mut restored = Vec::with_capacity(originals.len());
        for (path, contents) in originals {
            match self.manifest_writer.restore(&path, &contents) {
                Ok(()) => restored.push(path),
                Err(err) => {
                    error!(path = %path.display(), error = %err, "failed to restore manifest");
                }
            }
        }
        if !restored.is_empty() {
            info!(manifests = restored.len(), "reverted manifest edits");
        }
        restored
    }
}
