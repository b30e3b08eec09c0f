use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;
use wheels_git::{CommitInfo, FileChange, Repository, TagInfo};

use super::process::{last_lines, run_with_timeout};
use crate::traits::GitProvider;
use crate::{OperationError, Result};

const DEFAULT_PUSH_TIMEOUT: Duration = Duration::from_secs(300);

/// Reads and writes through `git2`; pushes through the `git` binary so the
/// user's credential helpers and SSH agent apply.
pub struct Git2Provider {
    push_timeout: Duration,
}

impl Git2Provider {
    #[must_use]
    pub fn new() -> Self {
        Self {
            push_timeout: DEFAULT_PUSH_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_push_timeout(mut self, timeout: Duration) -> Self {
        self.push_timeout = timeout;
        self
    }
}

impl Default for Git2Provider {
    fn default() -> Self {
        Self::new()
    }
}

impl GitProvider for Git2Provider {
    fn workdir(&self, project_root: &Path) -> Result<PathBuf> {
        let repo = Repository::open(project_root)?;
        Ok(repo.root().canonicalize()?)
    }

    fn head_sha(&self, project_root: &Path) -> Result<String> {
        let repo = Repository::open(project_root)?;
        Ok(repo.head_sha()?)
    }

    fn current_branch(&self, project_root: &Path) -> Result<String> {
        let repo = Repository::open(project_root)?;
        Ok(repo.current_branch()?)
    }

    fn is_working_tree_clean(&self, project_root: &Path) -> Result<bool> {
        let repo = Repository::open(project_root)?;
        Ok(repo.is_working_tree_clean()?)
    }

    fn list_tags(&self, project_root: &Path, prefix: &str) -> Result<Vec<TagInfo>> {
        let repo = Repository::open(project_root)?;
        Ok(repo.list_tags(prefix)?)
    }

    fn find_tag(&self, project_root: &Path, name: &str) -> Result<Option<TagInfo>> {
        let repo = Repository::open(project_root)?;
        Ok(repo.find_tag(name)?)
    }

    fn is_ancestor(&self, project_root: &Path, ancestor: &str, descendant: &str) -> Result<bool> {
        let repo = Repository::open(project_root)?;
        Ok(repo.is_ancestor(ancestor, descendant)?)
    }

    fn remote_branch_sha(
        &self,
        project_root: &Path,
        remote: &str,
        branch: &str,
    ) -> Result<Option<String>> {
        let repo = Repository::open(project_root)?;
        Ok(repo.remote_branch_sha(remote, branch)?)
    }

    fn changed_files(
        &self,
        project_root: &Path,
        base: &str,
        head: &str,
    ) -> Result<Vec<FileChange>> {
        let repo = Repository::open(project_root)?;
        Ok(repo.changed_files(Some(base), head)?)
    }

    fn create_tag(
        &self,
        project_root: &Path,
        name: &str,
        target: &str,
        message: &str,
    ) -> Result<TagInfo> {
        let repo = Repository::open(project_root)?;
        Ok(repo.create_tag(name, target, message)?)
    }

    fn stage_files(&self, project_root: &Path, paths: &[&Path]) -> Result<()> {
        let repo = Repository::open(project_root)?;
        Ok(repo.stage_files(paths)?)
    }

    fn commit(&self, project_root: &Path, message: &str) -> Result<CommitInfo> {
        let repo = Repository::open(project_root)?;
        Ok(repo.commit(message)?)
    }

    fn push(
        &self,
        project_root: &Path,
        remote: &str,
        branch: &str,
        tags: &[String],
    ) -> Result<()> {
        let workdir = self.workdir(project_root)?;

        let mut args = vec![
            "push".to_string(),
            remote.to_string(),
            format!("refs/heads/{branch}:refs/heads/{branch}"),
        ];
        args.extend(tags.iter().map(|tag| format!("refs/tags/{tag}")));

        info!(remote, branch, tags = tags.len(), "pushing release commit and tags");

        let output = run_with_timeout("git", &args, &workdir, self.push_timeout).map_err(
            |err| match err {
                OperationError::CommandTimedOut { command, timeout_secs } => {
                    OperationError::VcsWrite {
                        remote: remote.to_string(),
                        branch: branch.to_string(),
                        detail: format!("'{command}' timed out after {timeout_secs}s"),
                    }
                }
                other => other,
            },
        )?;

        if !output.success() {
            return Err(OperationError::VcsWrite {
                remote: remote.to_string(),
                branch: branch.to_string(),
                detail: last_lines(&output.stderr, 10),
            });
        }
        Ok(())
    }
}
