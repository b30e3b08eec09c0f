mod commit;
mod diff;
mod history;
mod staging;
mod status;
mod tag;

use std::path::{Path, PathBuf};

use crate::{GitError, Result};

pub struct Repository {
    pub(crate) inner: git2::Repository,
    root: PathBuf,
}

impl Repository {
    /// # Errors
    ///
    /// Returns [`GitError::NotARepository`] if the path is not inside a git repository.
    pub fn open(path: &Path) -> Result<Self> {
        let inner = git2::Repository::discover(path).map_err(|_| GitError::NotARepository {
            path: path.to_path_buf(),
        })?;

        let root = inner.workdir().ok_or_else(|| GitError::NotARepository {
            path: path.to_path_buf(),
        })?;

        // Use dunce to get a path without the \\?\ prefix on Windows
        let root = dunce::simplified(root).to_path_buf();

        Ok(Self { inner, root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute paths may come from a canonicalized workspace root, so the
    /// canonical form of the repository root is tried as well.
    pub(crate) fn to_relative_path(&self, path: &Path) -> PathBuf {
        if !path.is_absolute() {
            return path.to_path_buf();
        }

        let normalized = dunce::simplified(path);
        if let Ok(relative) = normalized.strip_prefix(&self.root) {
            return relative.to_path_buf();
        }

        self.root
            .canonicalize()
            .ok()
            .and_then(|root| {
                normalized
                    .strip_prefix(dunce::simplified(&root))
                    .ok()
                    .map(Path::to_path_buf)
            })
            .unwrap_or_else(|| path.to_path_buf())
    }

    pub(crate) fn resolve_commit(&self, refspec: &str) -> Result<git2::Commit<'_>> {
        let not_found = || GitError::RefNotFound {
            refspec: refspec.to_string(),
        };

        self.inner
            .revparse_single(refspec)
            .map_err(|_| not_found())?
            .peel_to_commit()
            .map_err(|_| not_found())
    }

    /// # Errors
    ///
    /// Returns [`GitError::RefNotFound`] if HEAD does not point at a commit.
    pub fn head_sha(&self) -> Result<String> {
        Ok(self.resolve_commit("HEAD")?.id().to_string())
    }
}
