use crate::Result;

use super::Repository;

impl Repository {
    /// Returns true if `ancestor` is `descendant` or one of its ancestors.
    ///
    /// # Errors
    ///
    /// Returns [`crate::GitError::RefNotFound`] if either revision cannot be
    /// resolved.
    pub fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool> {
        let ancestor = self.resolve_commit(ancestor)?.id();
        let descendant = self.resolve_commit(descendant)?.id();

        if ancestor == descendant {
            return Ok(true);
        }

        Ok(self.inner.graph_descendant_of(descendant, ancestor)?)
    }

    /// Commit of `refs/remotes/{remote}/{branch}`, or `None` when the
    /// remote-tracking branch has never been fetched.
    ///
    /// # Errors
    ///
    /// Returns an error if the reference exists but cannot be read.
    pub fn remote_branch_sha(&self, remote: &str, branch: &str) -> Result<Option<String>> {
        let name = format!("refs/remotes/{remote}/{branch}");
        match self.inner.find_reference(&name) {
            Ok(reference) => Ok(Some(reference.peel_to_commit()?.id().to_string())),
            Err(err) if err.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}
