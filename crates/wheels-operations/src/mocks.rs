use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use semver::Version;
use wheels_core::{Artifact, Dependency, DependencyGroup, PackageInfo};
use wheels_git::{CommitInfo, FileChange, GitError, TagInfo};
use wheels_project::{ReleaseConfig, UvWorkspace};

use crate::traits::{
    Builder, GitProvider, ManifestWriter, ProjectProvider, ReleaseHost, ReleaseSpec,
};
use crate::types::{PublishedRelease, RemoteArtifact};
use crate::{OperationError, Result};

pub const WORKSPACE_ROOT: &str = "/ws";

/// # Panics
///
/// Panics if the version string is not valid semver.
#[must_use]
pub fn package(name: &str, version: &str, deps: &[&str]) -> PackageInfo {
    let relative_path = PathBuf::from("packages").join(name);
    PackageInfo {
        name: name.to_string(),
        version: version.parse().expect("valid version"),
        path: Path::new(WORKSPACE_ROOT).join(&relative_path),
        relative_path,
        dependencies: deps
            .iter()
            .map(|dep| Dependency {
                name: (*dep).to_string(),
                raw_name: (*dep).to_string(),
                extras: BTreeSet::new(),
                specifier: None,
                marker: None,
                group: DependencyGroup::Main,
            })
            .collect(),
    }
}

/// `alpha`, `beta -> alpha`, `delta -> alpha`, `gamma -> beta`.
#[must_use]
pub fn fixture_packages() -> Vec<PackageInfo> {
    vec![
        package("alpha", "1.0.0", &[]),
        package("beta", "2.1.0", &["alpha"]),
        package("delta", "0.3.4", &["alpha"]),
        package("gamma", "1.2.0", &["beta"]),
    ]
}

/// Ordered record of calls across every mock sharing it.
#[derive(Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn record(&self, entry: impl Into<String>) {
        self.entries
            .lock()
            .expect("lock poisoned")
            .push(entry.into());
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().expect("lock poisoned").clone()
    }

    #[must_use]
    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|candidate| candidate == entry)
    }

    #[must_use]
    pub fn starting_with(&self, prefix: &str) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.starts_with(prefix))
            .collect()
    }
}

fn package_of(manifest_path: &Path) -> String {
    manifest_path
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub struct MockProjectProvider {
    workspace: UvWorkspace,
    config: ReleaseConfig,
}

impl MockProjectProvider {
    #[must_use]
    pub fn new(packages: Vec<PackageInfo>) -> Self {
        Self {
            workspace: UvWorkspace {
                root: PathBuf::from(WORKSPACE_ROOT),
                packages,
            },
            config: ReleaseConfig::default(),
        }
    }

    #[must_use]
    pub fn fixture() -> Self {
        Self::new(fixture_packages())
    }

    #[must_use]
    pub fn with_config(mut self, config: ReleaseConfig) -> Self {
        self.config = config;
        self
    }
}

impl ProjectProvider for MockProjectProvider {
    fn discover_workspace(&self, _start_path: &Path) -> Result<UvWorkspace> {
        Ok(self.workspace.clone())
    }

    fn load_config(&self, _workspace: &UvWorkspace) -> Result<ReleaseConfig> {
        Ok(self.config.clone())
    }
}

pub struct MockGitProvider {
    head: String,
    workdir: Option<PathBuf>,
    branch: String,
    clean: bool,
    tags: Mutex<Vec<TagInfo>>,
    reachable: HashSet<String>,
    diffs: HashMap<String, Vec<FileChange>>,
    diff_requests: Mutex<Vec<String>>,
    staged_files: Mutex<Vec<PathBuf>>,
    commits: Mutex<Vec<String>>,
    pushes: Mutex<Vec<(String, String, Vec<String>)>>,
    reject_push: bool,
    remote_tip: Option<String>,
    journal: Journal,
}

impl MockGitProvider {
    #[must_use]
    pub fn new(head: &str) -> Self {
        Self {
            head: head.to_string(),
            workdir: None,
            branch: "main".to_string(),
            clean: true,
            tags: Mutex::new(Vec::new()),
            reachable: HashSet::new(),
            diffs: HashMap::new(),
            diff_requests: Mutex::new(Vec::new()),
            staged_files: Mutex::new(Vec::new()),
            commits: Mutex::new(Vec::new()),
            pushes: Mutex::new(Vec::new()),
            reject_push: false,
            remote_tip: None,
            journal: Journal::new(),
        }
    }

    #[must_use]
    pub fn with_workdir(mut self, workdir: &str) -> Self {
        self.workdir = Some(PathBuf::from(workdir));
        self
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_tag(self, name: &str, target: &str) -> Self {
        self.tags.lock().expect("lock poisoned").push(TagInfo {
            name: name.to_string(),
            target_sha: target.to_string(),
        });
        self
    }

    /// Commits that are ancestors of HEAD.
    #[must_use]
    pub fn with_reachable(mut self, commits: &[&str]) -> Self {
        self.reachable
            .extend(commits.iter().map(|commit| (*commit).to_string()));
        self
    }

    #[must_use]
    pub fn with_diff(mut self, base: &str, changes: Vec<FileChange>) -> Self {
        self.diffs.insert(base.to_string(), changes);
        self
    }

    #[must_use]
    pub fn is_clean(mut self, clean: bool) -> Self {
        self.clean = clean;
        self
    }

    /// Tip of the remote-tracking branch. HEAD is on the remote only when it
    /// is this commit.
    #[must_use]
    pub fn with_remote_tip(mut self, sha: &str) -> Self {
        self.remote_tip = Some(sha.to_string());
        self
    }

    #[must_use]
    pub fn rejecting_push(mut self) -> Self {
        self.reject_push = true;
        self
    }

    #[must_use]
    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = journal;
        self
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn diff_requests(&self) -> Vec<String> {
        self.diff_requests.lock().expect("lock poisoned").clone()
    }

    #[must_use]
    pub fn tags_created(&self) -> Vec<String> {
        self.journal
            .starting_with("tag ")
            .into_iter()
            .map(|entry| entry.trim_start_matches("tag ").to_string())
            .collect()
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn staged_files(&self) -> Vec<PathBuf> {
        self.staged_files.lock().expect("lock poisoned").clone()
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn commits(&self) -> Vec<String> {
        self.commits.lock().expect("lock poisoned").clone()
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn pushes(&self) -> Vec<(String, String, Vec<String>)> {
        self.pushes.lock().expect("lock poisoned").clone()
    }
}

impl GitProvider for MockGitProvider {
    fn workdir(&self, project_root: &Path) -> Result<PathBuf> {
        Ok(self
            .workdir
            .clone()
            .unwrap_or_else(|| project_root.to_path_buf()))
    }

    fn head_sha(&self, _project_root: &Path) -> Result<String> {
        Ok(self.head.clone())
    }

    fn current_branch(&self, _project_root: &Path) -> Result<String> {
        Ok(self.branch.clone())
    }

    fn is_working_tree_clean(&self, _project_root: &Path) -> Result<bool> {
        Ok(self.clean)
    }

    fn list_tags(&self, _project_root: &Path, prefix: &str) -> Result<Vec<TagInfo>> {
        let mut tags: Vec<TagInfo> = self
            .tags
            .lock()
            .expect("lock poisoned")
            .iter()
            .filter(|tag| tag.name.starts_with(prefix))
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    fn find_tag(&self, _project_root: &Path, name: &str) -> Result<Option<TagInfo>> {
        Ok(self
            .tags
            .lock()
            .expect("lock poisoned")
            .iter()
            .find(|tag| tag.name == name)
            .cloned())
    }

    fn is_ancestor(&self, _project_root: &Path, ancestor: &str, descendant: &str) -> Result<bool> {
        Ok(ancestor == descendant
            || (descendant == self.head && self.reachable.contains(ancestor)))
    }

    fn remote_branch_sha(
        &self,
        _project_root: &Path,
        _remote: &str,
        _branch: &str,
    ) -> Result<Option<String>> {
        Ok(self.remote_tip.clone())
    }

    fn changed_files(
        &self,
        _project_root: &Path,
        base: &str,
        _head: &str,
    ) -> Result<Vec<FileChange>> {
        self.diff_requests
            .lock()
            .expect("lock poisoned")
            .push(base.to_string());
        Ok(self.diffs.get(base).cloned().unwrap_or_default())
    }

    fn create_tag(
        &self,
        _project_root: &Path,
        name: &str,
        target: &str,
        _message: &str,
    ) -> Result<TagInfo> {
        let mut tags = self.tags.lock().expect("lock poisoned");
        if tags.iter().any(|tag| tag.name == name) {
            return Err(GitError::TagExists {
                name: name.to_string(),
            }
            .into());
        }
        let tag = TagInfo {
            name: name.to_string(),
            target_sha: target.to_string(),
        };
        tags.push(tag.clone());
        self.journal.record(format!("tag {name}"));
        Ok(tag)
    }

    fn stage_files(&self, _project_root: &Path, paths: &[&Path]) -> Result<()> {
        self.staged_files
            .lock()
            .expect("lock poisoned")
            .extend(paths.iter().map(|p| p.to_path_buf()));
        Ok(())
    }

    fn commit(&self, _project_root: &Path, message: &str) -> Result<CommitInfo> {
        if self.staged_files.lock().expect("lock poisoned").is_empty() {
            return Err(GitError::NothingToCommit.into());
        }
        self.commits
            .lock()
            .expect("lock poisoned")
            .push(message.to_string());
        self.journal.record("commit");
        Ok(CommitInfo {
            sha: "bump0000".to_string(),
            message: message.to_string(),
        })
    }

    fn push(
        &self,
        _project_root: &Path,
        remote: &str,
        branch: &str,
        tags: &[String],
    ) -> Result<()> {
        if self.reject_push {
            return Err(OperationError::VcsWrite {
                remote: remote.to_string(),
                branch: branch.to_string(),
                detail: "! [rejected] main -> main (fetch first)".to_string(),
            });
        }
        self.pushes.lock().expect("lock poisoned").push((
            remote.to_string(),
            branch.to_string(),
            tags.to_vec(),
        ));
        self.journal.record("push");
        Ok(())
    }
}

impl GitProvider for Arc<MockGitProvider> {
    fn workdir(&self, project_root: &Path) -> Result<PathBuf> {
        (**self).workdir(project_root)
    }

    fn head_sha(&self, project_root: &Path) -> Result<String> {
        (**self).head_sha(project_root)
    }

    fn current_branch(&self, project_root: &Path) -> Result<String> {
        (**self).current_branch(project_root)
    }

    fn is_working_tree_clean(&self, project_root: &Path) -> Result<bool> {
        (**self).is_working_tree_clean(project_root)
    }

    fn list_tags(&self, project_root: &Path, prefix: &str) -> Result<Vec<TagInfo>> {
        (**self).list_tags(project_root, prefix)
    }

    fn find_tag(&self, project_root: &Path, name: &str) -> Result<Option<TagInfo>> {
        (**self).find_tag(project_root, name)
    }

    fn is_ancestor(&self, project_root: &Path, ancestor: &str, descendant: &str) -> Result<bool> {
        (**self).is_ancestor(project_root, ancestor, descendant)
    }

    fn remote_branch_sha(
        &self,
        project_root: &Path,
        remote: &str,
        branch: &str,
    ) -> Result<Option<String>> {
        (**self).remote_branch_sha(project_root, remote, branch)
    }

    fn changed_files(
        &self,
        project_root: &Path,
        base: &str,
        head: &str,
    ) -> Result<Vec<FileChange>> {
        (**self).changed_files(project_root, base, head)
    }

    fn create_tag(
        &self,
        project_root: &Path,
        name: &str,
        target: &str,
        message: &str,
    ) -> Result<TagInfo> {
        (**self).create_tag(project_root, name, target, message)
    }

    fn stage_files(&self, project_root: &Path, paths: &[&Path]) -> Result<()> {
        (**self).stage_files(project_root, paths)
    }

    fn commit(&self, project_root: &Path, message: &str) -> Result<CommitInfo> {
        (**self).commit(project_root, message)
    }

    fn push(&self, project_root: &Path, remote: &str, branch: &str, tags: &[String]) -> Result<()> {
        (**self).push(project_root, remote, branch, tags)
    }
}

/// Keeps manifest versions in memory, keyed by manifest path.
pub struct MockManifestWriter {
    versions: Mutex<HashMap<PathBuf, Version>>,
    pins: Mutex<Vec<(String, BTreeMap<String, Version>)>>,
    journal: Journal,
}

impl MockManifestWriter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            versions: Mutex::new(HashMap::new()),
            pins: Mutex::new(Vec::new()),
            journal: Journal::new(),
        }
    }

    #[must_use]
    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = journal;
        self
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn version_of(&self, package: &str) -> Option<Version> {
        self.versions
            .lock()
            .expect("lock poisoned")
            .iter()
            .find(|(path, _)| package_of(path) == package)
            .map(|(_, version)| version.clone())
    }

    /// Every pin write as `(package, pins)`, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn pin_writes(&self) -> Vec<(String, BTreeMap<String, Version>)> {
        self.pins.lock().expect("lock poisoned").clone()
    }
}

impl Default for MockManifestWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestWriter for MockManifestWriter {
    fn write_version(&self, manifest_path: &Path, new_version: &Version) -> Result<()> {
        self.versions
            .lock()
            .expect("lock poisoned")
            .insert(manifest_path.to_path_buf(), new_version.clone());
        self.journal
            .record(format!("bump {} {new_version}", package_of(manifest_path)));
        Ok(())
    }

    fn verify_version(&self, manifest_path: &Path, expected: &Version) -> Result<()> {
        let versions = self.versions.lock().expect("lock poisoned");
        match versions.get(manifest_path) {
            Some(actual) if actual == expected => Ok(()),
            _ => Err(wheels_manifest::ManifestError::VerificationFailed {
                path: manifest_path.to_path_buf(),
                expected: expected.to_string(),
                actual: versions
                    .get(manifest_path)
                    .map_or_else(|| "<unwritten>".to_string(), ToString::to_string),
            }
            .into()),
        }
    }

    fn write_dependency_pins(
        &self,
        manifest_path: &Path,
        pins: &BTreeMap<String, Version>,
    ) -> Result<usize> {
        let package = package_of(manifest_path);
        let rendered: Vec<String> = pins
            .iter()
            .map(|(name, version)| format!("{name}=={version}"))
            .collect();
        self.journal
            .record(format!("pin {package} {}", rendered.join(",")));
        self.pins
            .lock()
            .expect("lock poisoned")
            .push((package, pins.clone()));
        Ok(pins.len())
    }

    /// The snapshot is the written version, empty while untouched.
    fn snapshot(&self, manifest_path: &Path) -> Result<String> {
        Ok(self
            .versions
            .lock()
            .expect("lock poisoned")
            .get(manifest_path)
            .map(ToString::to_string)
            .unwrap_or_default())
    }

    fn restore(&self, manifest_path: &Path, contents: &str) -> Result<()> {
        let mut versions = self.versions.lock().expect("lock poisoned");
        match contents.parse::<Version>() {
            Ok(version) => versions.insert(manifest_path.to_path_buf(), version),
            Err(_) => versions.remove(manifest_path),
        };
        self.journal
            .record(format!("restore {}", package_of(manifest_path)));
        Ok(())
    }
}

impl ManifestWriter for Arc<MockManifestWriter> {
    fn write_version(&self, manifest_path: &Path, new_version: &Version) -> Result<()> {
        (**self).write_version(manifest_path, new_version)
    }

    fn verify_version(&self, manifest_path: &Path, expected: &Version) -> Result<()> {
        (**self).verify_version(manifest_path, expected)
    }

    fn write_dependency_pins(
        &self,
        manifest_path: &Path,
        pins: &BTreeMap<String, Version>,
    ) -> Result<usize> {
        (**self).write_dependency_pins(manifest_path, pins)
    }

    fn snapshot(&self, manifest_path: &Path) -> Result<String> {
        (**self).snapshot(manifest_path)
    }

    fn restore(&self, manifest_path: &Path, contents: &str) -> Result<()> {
        (**self).restore(manifest_path, contents)
    }
}

/// Pretends to build; returns one wheel path per package without touching
/// the file system.
pub struct MockBuilder {
    failing: HashSet<String>,
    built: Mutex<Vec<String>>,
    journal: Journal,
}

impl MockBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            failing: HashSet::new(),
            built: Mutex::new(Vec::new()),
            journal: Journal::new(),
        }
    }

    #[must_use]
    pub fn failing_for(mut self, package: &str) -> Self {
        self.failing.insert(package.to_string());
        self
    }

    #[must_use]
    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = journal;
        self
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn built(&self) -> Vec<String> {
        let mut built = self.built.lock().expect("lock poisoned").clone();
        built.sort();
        built
    }
}

impl Default for MockBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder for MockBuilder {
    fn build(&self, package: &PackageInfo, dist_dir: &Path) -> Result<Vec<Artifact>> {
        self.journal.record(format!("build {}", package.name));
        if self.failing.contains(&package.name) {
            return Err(OperationError::CommandFailed {
                command: format!("uv build {}", package.path.display()),
                status: "exit status: 1".to_string(),
                stderr: "error: setup failed".to_string(),
            });
        }
        self.built
            .lock()
            .expect("lock poisoned")
            .push(package.name.clone());
        Ok(vec![Artifact {
            package: package.name.clone(),
            version: package.version.clone(),
            path: dist_dir.join(format!(
                "{}-{}-py3-none-any.whl",
                package.name.replace('-', "_"),
                package.version
            )),
        }])
    }
}

impl Builder for Arc<MockBuilder> {
    fn build(&self, package: &PackageInfo, dist_dir: &Path) -> Result<Vec<Artifact>> {
        (**self).build(package, dist_dir)
    }
}

pub struct MockReleaseHost {
    published: HashMap<(String, String), Vec<RemoteArtifact>>,
    transient_create_failures: Mutex<u32>,
    reject_create: bool,
    downloads: Mutex<Vec<RemoteArtifact>>,
    releases: Mutex<Vec<ReleaseSpec>>,
    journal: Journal,
}

impl MockReleaseHost {
    #[must_use]
    pub fn new() -> Self {
        Self {
            published: HashMap::new(),
            transient_create_failures: Mutex::new(0),
            reject_create: false,
            downloads: Mutex::new(Vec::new()),
            releases: Mutex::new(Vec::new()),
            journal: Journal::new(),
        }
    }

    /// Registers a wheel for `package` `version` attached to `release`.
    #[must_use]
    pub fn with_published(mut self, package: &str, version: &str, release: &str) -> Self {
        self.published
            .entry((package.to_string(), version.to_string()))
            .or_default()
            .push(RemoteArtifact {
                release: release.to_string(),
                file_name: format!(
                    "{}-{version}-py3-none-any.whl",
                    package.replace('-', "_")
                ),
            });
        self
    }

    /// The first `count` create calls fail with a transient error.
    #[must_use]
    pub fn failing_creates(self, count: u32) -> Self {
        *self
            .transient_create_failures
            .lock()
            .expect("lock poisoned") = count;
        self
    }

    /// Every create call fails with a permanent error.
    #[must_use]
    pub fn rejecting_creates(mut self) -> Self {
        self.reject_create = true;
        self
    }

    #[must_use]
    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = journal;
        self
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn downloads(&self) -> Vec<RemoteArtifact> {
        let mut downloads = self.downloads.lock().expect("lock poisoned").clone();
        downloads.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        downloads
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn releases(&self) -> Vec<ReleaseSpec> {
        self.releases.lock().expect("lock poisoned").clone()
    }
}

impl Default for MockReleaseHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ReleaseHost for MockReleaseHost {
    fn find_artifacts(&self, package: &str, version: &Version) -> Result<Vec<RemoteArtifact>> {
        Ok(self
            .published
            .get(&(package.to_string(), version.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    fn download(&self, artifact: &RemoteArtifact, dest_dir: &Path) -> Result<PathBuf> {
        self.downloads
            .lock()
            .expect("lock poisoned")
            .push(artifact.clone());
        self.journal.record(format!("download {}", artifact.file_name));
        Ok(dest_dir.join(&artifact.file_name))
    }

    fn create_release(&self, spec: &ReleaseSpec) -> Result<PublishedRelease> {
        if self.reject_create {
            return Err(OperationError::CommandFailed {
                command: format!("gh release create {}", spec.name),
                status: "exit status: 1".to_string(),
                stderr: "HTTP 422: Validation Failed".to_string(),
            });
        }
        {
            let mut failures = self
                .transient_create_failures
                .lock()
                .expect("lock poisoned");
            if *failures > 0 {
                *failures -= 1;
                return Err(OperationError::TransientNetwork {
                    operation: "gh release create".to_string(),
                    detail: "HTTP 502: Bad Gateway".to_string(),
                });
            }
        }
        self.releases
            .lock()
            .expect("lock poisoned")
            .push(spec.clone());
        self.journal.record(format!("release {}", spec.name));
        Ok(PublishedRelease {
            name: spec.name.clone(),
            url: Some(format!("https://example.invalid/releases/{}", spec.name)),
        })
    }
}

impl ReleaseHost for Arc<MockReleaseHost> {
    fn find_artifacts(&self, package: &str, version: &Version) -> Result<Vec<RemoteArtifact>> {
        (**self).find_artifacts(package, version)
    }

    fn download(&self, artifact: &RemoteArtifact, dest_dir: &Path) -> Result<PathBuf> {
        (**self).download(artifact, dest_dir)
    }

    fn create_release(&self, spec: &ReleaseSpec) -> Result<PublishedRelease> {
        (**self).create_release(spec)
    }
}
