use crate::{GitError, Result, TagInfo};

use super::Repository;

impl Repository {
    /// Creates an annotated tag pointing at `target` (any revision that
    /// resolves to a commit).
    ///
    /// # Errors
    ///
    /// Returns [`GitError::TagExists`] if a tag with that name exists, or
    /// [`GitError::RefNotFound`] if `target` cannot be resolved.
    pub fn create_tag(&self, name: &str, target: &str, message: &str) -> Result<TagInfo> {
        let commit = self.resolve_commit(target)?;
        let sig = self.inner.signature()?;

        self.inner
            .tag(name, commit.as_object(), &sig, message, false)
            .map_err(|err| {
                if err.code() == git2::ErrorCode::Exists {
                    GitError::TagExists {
                        name: name.to_string(),
                    }
                } else {
                    GitError::Git(err)
                }
            })?;

        Ok(TagInfo {
            name: name.to_string(),
            target_sha: commit.id().to_string(),
        })
    }

    /// # Errors
    ///
    /// Returns an error if the tag exists but cannot be peeled to a commit.
    pub fn find_tag(&self, name: &str) -> Result<Option<TagInfo>> {
        let reference = match self.inner.find_reference(&format!("refs/tags/{name}")) {
            Ok(reference) => reference,
            Err(err) if err.code() == git2::ErrorCode::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let commit = reference.peel_to_commit()?;

        Ok(Some(TagInfo {
            name: name.to_string(),
            target_sha: commit.id().to_string(),
        }))
    }

    /// Lists every tag whose name starts with `prefix`, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag list cannot be read.
    pub fn list_tags(&self, prefix: &str) -> Result<Vec<TagInfo>> {
        let names = self.inner.tag_names(Some(&format!("{prefix}*")))?;

        let mut tags = Vec::new();
        for name in names.iter().flatten().filter(|name| name.starts_with(prefix)) {
            if let Some(tag) = self.find_tag(name)? {
                tags.push(tag);
            }
        }

        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }
}
