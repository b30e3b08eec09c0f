use std::path::Path;

use wheels_core::{Artifact, PackageInfo};

use crate::Result;

pub trait Builder: Send + Sync {
    /// Builds `package` and places its distributions in `dist_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the build tool fails, times out, or produces
    /// nothing.
    fn build(&self, package: &PackageInfo, dist_dir: &Path) -> Result<Vec<Artifact>>;
}
