use std::path::Path;

use wheels_project::{ReleaseConfig, UvWorkspace, discover_workspace, parse_release_config};

use crate::Result;
use crate::traits::ProjectProvider;

#[derive(Default)]
pub struct FileSystemProjectProvider;

impl FileSystemProjectProvider {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ProjectProvider for FileSystemProjectProvider {
    fn discover_workspace(&self, start_path: &Path) -> Result<UvWorkspace> {
        Ok(discover_workspace(start_path)?)
    }

    fn load_config(&self, workspace: &UvWorkspace) -> Result<ReleaseConfig> {
        Ok(parse_release_config(&workspace.root)?)
    }
}
