use std::path::{Path, PathBuf};

use wheels_git::{CommitInfo, FileChange, TagInfo};

use crate::Result;

pub trait GitProvider: Send + Sync {
    /// Root of the working tree containing `project_root`.
    ///
    /// # Errors
    ///
    /// Returns an error if no repository encloses `project_root`.
    fn workdir(&self, project_root: &Path) -> Result<PathBuf>;

    /// # Errors
    ///
    /// Returns an error if the repository cannot be opened or HEAD is unborn.
    fn head_sha(&self, project_root: &Path) -> Result<String>;

    /// # Errors
    ///
    /// Returns an error if the repository cannot be opened or HEAD is detached.
    fn current_branch(&self, project_root: &Path) -> Result<String>;

    /// # Errors
    ///
    /// Returns an error if the repository cannot be opened or status check fails.
    fn is_working_tree_clean(&self, project_root: &Path) -> Result<bool>;

    /// Tags whose name starts with `prefix`, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the tags cannot be listed.
    fn list_tags(&self, project_root: &Path, prefix: &str) -> Result<Vec<TagInfo>>;

    /// # Errors
    ///
    /// Returns an error if the repository cannot be read.
    fn find_tag(&self, project_root: &Path, name: &str) -> Result<Option<TagInfo>>;

    /// # Errors
    ///
    /// Returns an error if either commit cannot be resolved.
    fn is_ancestor(&self, project_root: &Path, ancestor: &str, descendant: &str) -> Result<bool>;

    /// Last known commit of `branch` on `remote`, from the local
    /// remote-tracking ref. `None` if it was never fetched.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository cannot be read.
    fn remote_branch_sha(&self, project_root: &Path, remote: &str, branch: &str)
    -> Result<Option<String>>;

    /// Paths are relative to [`GitProvider::workdir`].
    ///
    /// # Errors
    ///
    /// Returns an error if the repository cannot be opened or diff fails.
    fn changed_files(&self, project_root: &Path, base: &str, head: &str)
    -> Result<Vec<FileChange>>;

    /// # Errors
    ///
    /// Returns an error if the tag cannot be created or already exists.
    fn create_tag(
        &self,
        project_root: &Path,
        name: &str,
        target: &str,
        message: &str,
    ) -> Result<TagInfo>;

    /// # Errors
    ///
    /// Returns an error if staging any of the files fails.
    fn stage_files(&self, project_root: &Path, paths: &[&Path]) -> Result<()>;

    /// # Errors
    ///
    /// Returns an error if nothing is staged or the commit cannot be created.
    fn commit(&self, project_root: &Path, message: &str) -> Result<CommitInfo>;

    /// Pushes `branch` and every tag in `tags` to `remote`.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::VcsWrite` if the remote rejects the push.
    fn push(&self, project_root: &Path, remote: &str, branch: &str, tags: &[String])
    -> Result<()>;
}
