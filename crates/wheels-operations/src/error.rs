use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OperationError {
    #[error(transparent)]
    Core(#[from] wheels_core::CoreError),

    #[error(transparent)]
    Git(#[from] wheels_git::GitError),

    #[error(transparent)]
    Project(#[from] wheels_project::ProjectError),

    #[error(transparent)]
    Manifest(#[from] wheels_manifest::ManifestError),

    #[error("version check failed")]
    Version(#[from] wheels_version::VersionError),

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("failed to parse {context} output")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to start worker pool")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to run '{program}'")]
    CommandSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("'{command}' timed out after {timeout_secs}s")]
    CommandTimedOut { command: String, timeout_secs: u64 },

    #[error("build of '{package}' failed")]
    Build {
        package: String,
        #[source]
        source: Box<OperationError>,
    },

    #[error("build of '{package}' produced no artifacts in '{}'", out_dir.display())]
    NoArtifactsProduced { package: String, out_dir: PathBuf },

    #[error(
        "no published artifact for {package} {version}; set missing-artifact = \"rebuild\" to build it instead"
    )]
    MissingArtifact { package: String, version: String },

    #[error("transient failure during {operation}: {detail}")]
    TransientNetwork { operation: String, detail: String },

    #[error(
        "push to '{remote}' was rejected: {detail}\nthe release is published and the version bump is committed locally; once the remote accepts it, run: git push --follow-tags {remote} {branch}"
    )]
    VcsWrite {
        remote: String,
        branch: String,
        detail: String,
    },

    #[error("tag '{tag}' already exists at {existing}, expected {expected}")]
    TagConflict {
        tag: String,
        existing: String,
        expected: String,
    },

    #[error("package versions already published: {}; bump their versions before releasing", packages.join(", "))]
    DuplicateVersion { packages: Vec<String> },

    #[error("nothing changed since last release")]
    NothingToRelease,

    #[error("working tree has uncommitted changes; commit or stash them first")]
    DirtyWorkingTree,

    #[error("HEAD {head} is not on '{remote}/{branch}'; push it before releasing")]
    HeadNotPushed {
        head: String,
        remote: String,
        branch: String,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("unknown package '{name}'")]
    UnknownPackage { name: String },

    #[error("release failed at stage '{stage}'")]
    StageFailed {
        stage: String,
        completed: Vec<String>,
        tags_created: Vec<String>,
        #[source]
        source: Box<OperationError>,
    },
}

impl OperationError {
    /// Whether retrying the same call may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::TransientNetwork { .. } => true,
            Self::StageFailed { source, .. } | Self::Build { source, .. } => source.is_transient(),
            _ => false,
        }
    }

    /// Stages that finished before a release stopped, empty for other errors.
    #[must_use]
    pub fn completed_stages(&self) -> &[String] {
        match self {
            Self::StageFailed { completed, .. } => completed,
            _ => &[],
        }
    }

    #[must_use]
    pub fn tags_created(&self) -> &[String] {
        match self {
            Self::StageFailed { tags_created, .. } => tags_created,
            _ => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, OperationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_version_lists_packages() {
        let err = OperationError::DuplicateVersion {
            packages: vec!["alpha 1.0.0".to_string(), "beta 2.1.0".to_string()],
        };

        let msg = err.to_string();

        assert!(msg.contains("alpha 1.0.0, beta 2.1.0"));
    }

    #[test]
    fn rejected_push_names_the_recovery_command() {
        let err = OperationError::VcsWrite {
            remote: "origin".to_string(),
            branch: "main".to_string(),
            detail: "! [rejected] main -> main (fetch first)".to_string(),
        };

        let msg = err.to_string();

        assert!(msg.contains("(fetch first)"));
        assert!(msg.contains("git push --follow-tags origin main"));
    }

    #[test]
    fn transient_classification_looks_through_wrappers() {
        let inner = OperationError::TransientNetwork {
            operation: "gh release create".to_string(),
            detail: "HTTP 502".to_string(),
        };
        let wrapped = OperationError::StageFailed {
            stage: "publish".to_string(),
            completed: Vec::new(),
            tags_created: Vec::new(),
            source: Box::new(inner),
        };

        assert!(wrapped.is_transient());
        assert!(!OperationError::NothingToRelease.is_transient());
    }

    #[test]
    fn stage_failure_exposes_progress() {
        let err = OperationError::StageFailed {
            stage: "push".to_string(),
            completed: vec!["discover".to_string(), "tag".to_string()],
            tags_created: vec!["alpha/v1.0.0".to_string()],
            source: Box::new(OperationError::Cancelled),
        };

        assert_eq!(err.completed_stages(), ["discover", "tag"]);
        assert_eq!(err.tags_created(), ["alpha/v1.0.0"]);
        assert!(OperationError::Cancelled.completed_stages().is_empty());
    }
}
