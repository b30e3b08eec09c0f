use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use wheels_core::{PackageInfo, PackageTag, ReleaseName};
use wheels_git::TagInfo;
use wheels_project::{ReleaseConfig, RootChangePolicy, map_files_to_packages};

use crate::Result;
use crate::traits::GitProvider;
use crate::types::{ChangeReason, ChangeRecord};

/// The newest release tag of a package that HEAD already contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastRelease {
    pub tag: PackageTag,
    pub target_sha: String,
}

/// Decides per package whether anything changed since its last release tag.
pub struct ChangeDetector<'a, G> {
    git: &'a G,
    workspace_root: &'a Path,
    config: &'a ReleaseConfig,
    head: String,
    /// Workspace root relative to the repository working tree.
    workspace_prefix: PathBuf,
    /// A release name tag (`r<N>`) points at HEAD, so package tags there
    /// belong to a published release.
    published_at_head: bool,
}

impl<'a, G: GitProvider> ChangeDetector<'a, G> {
    /// # Errors
    ///
    /// Returns an error if HEAD, the repository working tree or the release
    /// tags cannot be resolved.
    pub fn new(git: &'a G, workspace_root: &'a Path, config: &'a ReleaseConfig) -> Result<Self> {
        let head = git.head_sha(workspace_root)?;
        let workdir = git.workdir(workspace_root)?;
        let workspace_prefix = workspace_root
            .strip_prefix(&workdir)
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let prefix = config.release_prefix();
        let published_at_head = git
            .list_tags(workspace_root, prefix)?
            .iter()
            .any(|tag| tag.target_sha == head && ReleaseName::parse(prefix, &tag.name).is_ok());

        Ok(Self {
            git,
            workspace_root,
            config,
            head,
            workspace_prefix,
            published_at_head,
        })
    }

    #[must_use]
    pub fn head(&self) -> &str {
        &self.head
    }

    /// Finds the highest `{name}/v{version}` tag reachable from HEAD,
    /// including one on HEAD itself.
    ///
    /// # Errors
    ///
    /// Returns an error if tags cannot be listed or ancestry cannot be
    /// checked.
    pub fn last_release(&self, package: &PackageInfo) -> Result<Option<LastRelease>> {
        let prefix = PackageTag::prefix_for(&package.name);
        let mut last: Option<LastRelease> = None;

        for TagInfo { name, target_sha } in self.git.list_tags(self.workspace_root, &prefix)? {
            let Ok(tag) = name.parse::<PackageTag>() else {
                debug!(tag = %name, "skipping tag that is not a package release");
                continue;
            };
            if tag.package != package.name {
                continue;
            }
            if target_sha != self.head
                && !self.git.is_ancestor(self.workspace_root, &target_sha, &self.head)?
            {
                continue;
            }
            if last.as_ref().is_none_or(|current| tag.version > current.tag.version) {
                last = Some(LastRelease { tag, target_sha });
            }
        }

        Ok(last)
    }

    /// A tag for the current version on HEAD without a release name tag
    /// beside it was left by a run that stopped before publishing.
    fn is_interrupted(&self, package: &PackageInfo, last: &LastRelease) -> bool {
        !self.published_at_head && last.target_sha == self.head && last.tag.version == package.version
    }

    /// # Errors
    ///
    /// Returns an error if tags cannot be read or a diff fails.
    pub fn detect_all(
        &self,
        packages: &[&PackageInfo],
        force_all: bool,
    ) -> Result<BTreeMap<String, ChangeRecord>> {
        let mut records = BTreeMap::new();
        for package in packages {
            let record = self.detect(package, packages, force_all)?;
            match record.reason {
                Some(reason) => info!(
                    package = %package.name,
                    last_tag = record.last_tag.as_deref().unwrap_or("<none>"),
                    %reason,
                    "changed"
                ),
                None => debug!(package = %package.name, "unchanged"),
            }
            records.insert(package.name.clone(), record);
        }
        Ok(records)
    }

    /// `siblings` is every workspace package, so files inside a nested
    /// package are never attributed to the enclosing one.
    ///
    /// # Errors
    ///
    /// Returns an error if tags cannot be read or a diff fails.
    pub fn detect(
        &self,
        package: &PackageInfo,
        siblings: &[&PackageInfo],
        force_all: bool,
    ) -> Result<ChangeRecord> {
        let last = self.last_release(package)?;

        let mut record = ChangeRecord::unchanged(package.name.clone());
        record.last_tag = last.as_ref().map(|release| release.tag.to_string());
        record.tag_commit = last.as_ref().map(|release| release.target_sha.clone());
        record.resume_tag = last
            .as_ref()
            .filter(|release| self.is_interrupted(package, release))
            .map(|release| release.tag.to_string());

        if force_all {
            record.changed_directly = true;
            record.reason = Some(ChangeReason::Forced);
            return Ok(record);
        }

        if record.resume_tag.is_some() {
            record.changed_directly = true;
            record.reason = Some(ChangeReason::Resumed);
            return Ok(record);
        }

        let Some(last) = last else {
            record.changed_directly = true;
            record.reason = Some(ChangeReason::FirstRelease);
            return Ok(record);
        };

        if last.target_sha == self.head {
            return Ok(record);
        }

        let changed = self.changed_since(&last.target_sha)?;
        let mapping = map_files_to_packages(siblings, &changed, self.config);

        let files = mapping.files_for(&package.name);
        if !files.is_empty() {
            record.files = files.to_vec();
            record.changed_directly = true;
            record.reason = Some(ChangeReason::FilesChanged);
            return Ok(record);
        }

        if self.config.root_changes() == RootChangePolicy::MarkAllDirty {
            let root_files: Vec<PathBuf> =
                mapping.shared_root_files(self.config).cloned().collect();
            if !root_files.is_empty() {
                record.files = root_files;
                record.changed_directly = true;
                record.reason = Some(ChangeReason::RootConfigChanged);
            }
        }

        Ok(record)
    }

    /// Workspace-relative paths touched between `base` and HEAD. Paths
    /// outside the workspace are dropped.
    fn changed_since(&self, base: &str) -> Result<Vec<PathBuf>> {
        let changes = self.git.changed_files(self.workspace_root, base, &self.head)?;
        let mut paths: Vec<PathBuf> = changes
            .iter()
            .flat_map(|change| change.touched_paths())
            .filter_map(|path| path.strip_prefix(&self.workspace_prefix).ok())
            .map(Path::to_path_buf)
            .collect();
        paths.sort();
        paths.dedup();
        Ok(paths)
    }
}
