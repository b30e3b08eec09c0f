use std::path::Path;

use wheels_project::{ReleaseConfig, UvWorkspace};

use crate::Result;

pub trait ProjectProvider: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if no workspace can be found from the given path or a
    /// member manifest cannot be read.
    fn discover_workspace(&self, start_path: &Path) -> Result<UvWorkspace>;

    /// # Errors
    ///
    /// Returns an error if the `[tool.lazy-wheels]` table is invalid.
    fn load_config(&self, workspace: &UvWorkspace) -> Result<ReleaseConfig>;
}
