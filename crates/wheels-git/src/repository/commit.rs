use crate::{CommitInfo, GitError, Result};

use super::Repository;

impl Repository {
    /// Commits the current index on top of HEAD.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::NothingToCommit`] if the index matches HEAD, or an
    /// error if the commit cannot be created.
    pub fn commit(&self, message: &str) -> Result<CommitInfo> {
        let sig = self.inner.signature()?;
        let mut index = self.inner.index()?;
        let tree_id = index.write_tree()?;
        let tree = self.inner.find_tree(tree_id)?;

        let parent = self.inner.head().ok().and_then(|h| h.peel_to_commit().ok());

        if parent.as_ref().is_some_and(|parent| parent.tree_id() == tree_id) {
            return Err(GitError::NothingToCommit);
        }

        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        let commit_oid = self
            .inner
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?;

        Ok(CommitInfo {
            sha: commit_oid.to_string(),
            message: message.to_string(),
        })
    }
}
