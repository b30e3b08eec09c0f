mod config;
mod error;
mod graph;
mod mapping;
mod metadata;
mod workspace;

pub use config::{MissingArtifactPolicy, ReleaseConfig, RetryConfig, RootChangePolicy, parse_release_config};
pub use error::ProjectError;
pub use graph::PackageGraph;
pub use mapping::{FileMapping, map_files_to_packages};
pub use workspace::{UvWorkspace, discover_workspace};

pub type Result<T> = std::result::Result<T, ProjectError>;
