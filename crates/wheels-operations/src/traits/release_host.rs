use std::path::{Path, PathBuf};

use semver::Version;

use crate::Result;
use crate::types::{PublishedRelease, RemoteArtifact};

/// Everything needed to create one release at the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSpec {
    pub name: String,
    /// Commit the release tag is created at.
    pub target_commit: String,
    pub title: String,
    pub notes: String,
    pub artifacts: Vec<PathBuf>,
    /// Package tags created or confirmed by this run.
    pub tags: Vec<String>,
}

pub trait ReleaseHost: Send + Sync {
    /// Published distributions of `package` at exactly `version`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot be queried.
    fn find_artifacts(&self, package: &str, version: &Version) -> Result<Vec<RemoteArtifact>>;

    /// Downloads `artifact` into `dest_dir` and returns the local path.
    ///
    /// # Errors
    ///
    /// Returns an error if the download fails.
    fn download(&self, artifact: &RemoteArtifact, dest_dir: &Path) -> Result<PathBuf>;

    /// # Errors
    ///
    /// Returns an error if the release cannot be created.
    fn create_release(&self, spec: &ReleaseSpec) -> Result<PublishedRelease>;
}
