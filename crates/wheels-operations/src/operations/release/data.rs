use std::collections::BTreeMap;
use std::path::PathBuf;

use semver::Version;
use wheels_core::{Artifact, PackageInfo};
use wheels_git::CommitInfo;
use wheels_project::{PackageGraph, ReleaseConfig};

use crate::operations::discovery::Discovery;
use crate::types::{ChangeRecord, DirtySet, PublishedRelease};

/// State handed from one release stage to the next.
#[derive(Debug, Clone)]
pub struct ReleaseData {
    pub discovery: Discovery,
    pub force_all: bool,
    pub branch: String,

    pub records: BTreeMap<String, ChangeRecord>,
    pub dirty: DirtySet,

    /// Artifacts of clean packages downloaded from earlier releases.
    pub fetched: Vec<Artifact>,
    /// Dirty packages, dependencies first.
    pub build_order: Vec<String>,
    pub built: Vec<Artifact>,

    pub tags: Vec<TagOutcome>,
    pub bumps: Vec<VersionBump>,
    pub published: Option<PublishedRelease>,
    pub commit: Option<CommitInfo>,
}

impl ReleaseData {
    #[must_use]
    pub fn new(discovery: Discovery, force_all: bool, branch: String) -> Self {
        Self {
            discovery,
            force_all,
            branch,
            records: BTreeMap::new(),
            dirty: DirtySet::new(),
            fetched: Vec::new(),
            build_order: Vec::new(),
            built: Vec::new(),
            tags: Vec::new(),
            bumps: Vec::new(),
            published: None,
            commit: None,
        }
    }

    #[must_use]
    pub fn root(&self) -> &std::path::Path {
        &self.discovery.workspace.root
    }

    #[must_use]
    pub fn config(&self) -> &ReleaseConfig {
        &self.discovery.config
    }

    #[must_use]
    pub fn graph(&self) -> &PackageGraph {
        &self.discovery.graph
    }

    #[must_use]
    pub fn head(&self) -> &str {
        &self.discovery.head_sha
    }

    #[must_use]
    pub fn dist_dir(&self) -> PathBuf {
        self.root().join(self.config().dist_dir())
    }

    /// Packages outside the dirty set, sorted by name.
    #[must_use]
    pub fn clean_packages(&self) -> Vec<&PackageInfo> {
        self.graph()
            .packages()
            .filter(|package| !self.dirty.contains(&package.name))
            .collect()
    }

    /// Dirty packages in build order.
    #[must_use]
    pub fn dirty_packages(&self) -> Vec<&PackageInfo> {
        self.build_order
            .iter()
            .filter_map(|name| self.graph().package(name))
            .collect()
    }

    #[must_use]
    pub fn is_resume(&self, package: &str) -> bool {
        self.records.get(package).is_some_and(ChangeRecord::is_resume)
    }

    #[must_use]
    pub fn tag_names(&self) -> Vec<String> {
        self.tags.iter().map(|tag| tag.name.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagOutcome {
    pub name: String,
    /// `false` when an earlier run already created the tag.
    pub created: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionBump {
    pub package: String,
    pub manifest_path: PathBuf,
    pub old: Version,
    pub new: Version,
}
