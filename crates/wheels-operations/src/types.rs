use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Why a package is considered changed since its last release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeReason {
    FirstRelease,
    FilesChanged,
    RootConfigChanged,
    /// Tagged on HEAD by a run that stopped before publishing.
    Resumed,
    Forced,
}

impl fmt::Display for ChangeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::FirstRelease => "first release",
            Self::FilesChanged => "files changed",
            Self::RootConfigChanged => "root config changed",
            Self::Resumed => "interrupted release",
            Self::Forced => "forced",
        };
        f.write_str(text)
    }
}

/// Per-package outcome of change detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeRecord {
    pub package: String,
    pub last_tag: Option<String>,
    /// Commit the last tag points at.
    pub tag_commit: Option<String>,
    /// Tag for the current version that already points at HEAD, left by a
    /// run that stopped before publishing.
    pub resume_tag: Option<String>,
    pub changed_directly: bool,
    /// Workspace-relative files attributed to the package.
    pub files: Vec<PathBuf>,
    pub reason: Option<ChangeReason>,
}

impl ChangeRecord {
    #[must_use]
    pub fn unchanged(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            last_tag: None,
            tag_commit: None,
            resume_tag: None,
            changed_directly: false,
            files: Vec::new(),
            reason: None,
        }
    }

    #[must_use]
    pub fn is_resume(&self) -> bool {
        self.resume_tag.is_some()
    }
}

/// How a package entered the dirty set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "via", rename_all = "kebab-case")]
pub enum DirtyCause {
    Changed,
    Forced,
    /// Reached over a reverse edge from the named dependency.
    DependsOn(String),
    /// Its published artifact was missing and the policy is to rebuild.
    MissingArtifact,
}

impl fmt::Display for DirtyCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Changed => f.write_str("changed"),
            Self::Forced => f.write_str("forced"),
            Self::DependsOn(dependency) => write!(f, "depends on {dependency}"),
            Self::MissingArtifact => f.write_str("missing artifact"),
        }
    }
}

/// Packages that must be rebuilt in this release.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirtySet {
    members: BTreeMap<String, DirtyCause>,
}

impl DirtySet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `name` unless it is already dirty. Returns whether it was added.
    pub fn insert(&mut self, name: impl Into<String>, cause: DirtyCause) -> bool {
        let name = name.into();
        if self.members.contains_key(&name) {
            return false;
        }
        self.members.insert(name, cause);
        true
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    #[must_use]
    pub fn cause(&self, name: &str) -> Option<&DirtyCause> {
        self.members.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    #[must_use]
    pub fn to_set(&self) -> BTreeSet<String> {
        self.members.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DirtyCause)> {
        self.members.iter().map(|(name, cause)| (name.as_str(), cause))
    }
}

/// Input of one release run, usually taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct ReleaseRequest {
    pub start_path: PathBuf,
    /// Explicit release name; the next `r<N>` is used when absent.
    pub release_name: Option<String>,
    pub force_all: bool,
    pub allow_dirty: bool,
    /// Overrides the configured build worker bound.
    pub build_jobs: Option<usize>,
}

/// An artifact stored at the release host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteArtifact {
    /// Release the artifact is attached to.
    pub release: String,
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedRelease {
    pub name: String,
    pub url: Option<String>,
}
