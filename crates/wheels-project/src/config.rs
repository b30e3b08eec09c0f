use std::path::{Path, PathBuf};
use std::time::Duration;

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;

use crate::error::ProjectError;
use crate::metadata::{LazyWheelsMetadata, RetryMetadata, read_metadata};

pub const DEFAULT_DIST_DIR: &str = "dist";
pub const DEFAULT_REMOTE: &str = "origin";
pub const DEFAULT_RELEASE_PREFIX: &str = "r";
pub const DEFAULT_COMMIT_MESSAGE: &str = "chore: prepare next release";
pub const DEFAULT_BUILD_COMMAND: &str = "uv";
const DEFAULT_ROOT_FILES: [&str; 2] = ["pyproject.toml", "uv.lock"];

/// What to do when files outside every package directory changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RootChangePolicy {
    #[default]
    Ignore,
    MarkAllDirty,
}

/// What to do when a clean package has no published artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingArtifactPolicy {
    #[default]
    Fail,
    Rebuild,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
        }
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    #[must_use]
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }
}

#[derive(Debug, Clone)]
pub struct ReleaseConfig {
    dist_dir: PathBuf,
    remote: String,
    release_prefix: String,
    commit_message: String,
    root_changes: RootChangePolicy,
    root_files: GlobSet,
    ignored_files: GlobSet,
    missing_artifact: MissingArtifactPolicy,
    build_jobs: usize,
    fetch_jobs: usize,
    build_timeout: Duration,
    network_timeout: Duration,
    build_command: String,
    retry: RetryConfig,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        let cores = num_cpus::get().max(1);
        Self {
            dist_dir: PathBuf::from(DEFAULT_DIST_DIR),
            remote: DEFAULT_REMOTE.to_string(),
            release_prefix: DEFAULT_RELEASE_PREFIX.to_string(),
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
            root_changes: RootChangePolicy::default(),
            root_files: default_root_files(),
            ignored_files: GlobSet::empty(),
            missing_artifact: MissingArtifactPolicy::default(),
            build_jobs: cores,
            fetch_jobs: cores * 4,
            build_timeout: Duration::from_secs(1800),
            network_timeout: Duration::from_secs(300),
            build_command: DEFAULT_BUILD_COMMAND.to_string(),
            retry: RetryConfig::default(),
        }
    }
}

fn default_root_files() -> GlobSet {
    let patterns: Vec<String> = DEFAULT_ROOT_FILES.iter().map(ToString::to_string).collect();
    build_glob_set(&patterns).unwrap_or_else(|_| GlobSet::empty())
}

impl ReleaseConfig {
    /// Directory that receives built and downloaded artifacts, relative to
    /// the workspace root.
    #[must_use]
    pub fn dist_dir(&self) -> &Path {
        &self.dist_dir
    }

    #[must_use]
    pub fn remote(&self) -> &str {
        &self.remote
    }

    #[must_use]
    pub fn release_prefix(&self) -> &str {
        &self.release_prefix
    }

    #[must_use]
    pub fn commit_message(&self) -> &str {
        &self.commit_message
    }

    #[must_use]
    pub fn root_changes(&self) -> RootChangePolicy {
        self.root_changes
    }

    /// Whether a workspace-relative path counts as a shared root file.
    #[must_use]
    pub fn is_root_file(&self, path: &Path) -> bool {
        self.root_files.is_match(path)
    }

    #[must_use]
    pub fn is_ignored(&self, path: &Path) -> bool {
        self.ignored_files.is_match(path)
    }

    #[must_use]
    pub fn missing_artifact(&self) -> MissingArtifactPolicy {
        self.missing_artifact
    }

    #[must_use]
    pub fn build_jobs(&self) -> usize {
        self.build_jobs
    }

    #[must_use]
    pub fn fetch_jobs(&self) -> usize {
        self.fetch_jobs
    }

    #[must_use]
    pub fn build_timeout(&self) -> Duration {
        self.build_timeout
    }

    #[must_use]
    pub fn network_timeout(&self) -> Duration {
        self.network_timeout
    }

    #[must_use]
    pub fn build_command(&self) -> &str {
        &self.build_command
    }

    #[must_use]
    pub fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    /// Overrides the build worker bound, e.g. from `--jobs`.
    #[must_use]
    pub fn with_build_jobs(mut self, jobs: usize) -> Self {
        self.build_jobs = jobs.max(1);
        self
    }

    #[cfg(any(test, feature = "testing"))]
    #[must_use]
    pub fn with_root_changes(mut self, policy: RootChangePolicy) -> Self {
        self.root_changes = policy;
        self
    }

    #[cfg(any(test, feature = "testing"))]
    #[must_use]
    pub fn with_missing_artifact(mut self, policy: MissingArtifactPolicy) -> Self {
        self.missing_artifact = policy;
        self
    }

    #[cfg(any(test, feature = "testing"))]
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    #[cfg(any(test, feature = "testing"))]
    #[must_use]
    pub fn with_dist_dir(mut self, dist_dir: impl Into<PathBuf>) -> Self {
        self.dist_dir = dist_dir.into();
        self
    }
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet, ProjectError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| ProjectError::GlobPattern {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| ProjectError::GlobPattern {
        pattern: patterns.join(", "),
        source,
    })
}

fn positive(field: &'static str, value: usize) -> Result<usize, ProjectError> {
    if value == 0 {
        return Err(ProjectError::InvalidConfig {
            field,
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(value)
}

fn build_retry_config(metadata: Option<&RetryMetadata>) -> Result<RetryConfig, ProjectError> {
    let defaults = RetryConfig::default();
    let Some(retry) = metadata else {
        return Ok(defaults);
    };

    let max_attempts = retry.max_attempts.unwrap_or(defaults.max_attempts);
    if max_attempts == 0 {
        return Err(ProjectError::InvalidConfig {
            field: "retry.max-attempts",
            reason: "must be at least 1".to_string(),
        });
    }

    let base_delay = retry
        .base_delay_ms
        .map_or(defaults.base_delay, Duration::from_millis);
    let max_delay = retry
        .max_delay_ms
        .map_or(defaults.max_delay, Duration::from_millis);
    if max_delay < base_delay {
        return Err(ProjectError::InvalidConfig {
            field: "retry.max-delay-ms",
            reason: "must not be smaller than retry.base-delay-ms".to_string(),
        });
    }

    Ok(RetryConfig::new(max_attempts, base_delay, max_delay))
}

fn build_release_config(metadata: &LazyWheelsMetadata) -> Result<ReleaseConfig, ProjectError> {
    let defaults = ReleaseConfig::default();

    let root_files = match &metadata.root_files {
        Some(patterns) => build_glob_set(patterns)?,
        None => defaults.root_files,
    };

    let release_prefix = metadata
        .release_prefix
        .clone()
        .unwrap_or(defaults.release_prefix);
    if release_prefix.is_empty() || release_prefix.contains('/') {
        return Err(ProjectError::InvalidConfig {
            field: "release-prefix",
            reason: format!("'{release_prefix}' must be non-empty and contain no '/'"),
        });
    }

    Ok(ReleaseConfig {
        dist_dir: metadata
            .dist_dir
            .as_ref()
            .map_or(defaults.dist_dir, PathBuf::from),
        remote: metadata.remote.clone().unwrap_or(defaults.remote),
        release_prefix,
        commit_message: metadata
            .commit_message
            .clone()
            .unwrap_or(defaults.commit_message),
        root_changes: metadata.root_changes.unwrap_or(defaults.root_changes),
        root_files,
        ignored_files: build_glob_set(&metadata.ignored_files)?,
        missing_artifact: metadata
            .missing_artifact
            .unwrap_or(defaults.missing_artifact),
        build_jobs: positive(
            "build-jobs",
            metadata.build_jobs.unwrap_or(defaults.build_jobs),
        )?,
        fetch_jobs: positive(
            "fetch-jobs",
            metadata.fetch_jobs.unwrap_or(defaults.fetch_jobs),
        )?,
        build_timeout: metadata
            .build_timeout_secs
            .map_or(defaults.build_timeout, Duration::from_secs),
        network_timeout: metadata
            .network_timeout_secs
            .map_or(defaults.network_timeout, Duration::from_secs),
        build_command: metadata
            .build_command
            .clone()
            .unwrap_or(defaults.build_command),
        retry: build_retry_config(metadata.retry.as_ref())?,
    })
}

/// Reads `[tool.lazy-wheels]` from the workspace root manifest. Every key is
/// optional; a missing table yields the defaults.
///
/// # Errors
///
/// Returns an error if the manifest cannot be read or parsed, the table has
/// unknown keys, a glob pattern is invalid, or a value is out of range.
pub fn parse_release_config(workspace_root: &Path) -> Result<ReleaseConfig, ProjectError> {
    let manifest_path = workspace_root.join("pyproject.toml");

    match read_metadata(&manifest_path)? {
        Some(metadata) => build_release_config(&metadata),
        None => Ok(ReleaseConfig::default()),
    }
}
