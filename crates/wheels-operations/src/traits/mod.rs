mod builder;
mod git_provider;
mod manifest_writer;
mod project_provider;
mod release_host;

pub use builder::Builder;
pub use git_provider::GitProvider;
pub use manifest_writer::ManifestWriter;
pub use project_provider::ProjectProvider;
pub use release_host::{ReleaseHost, ReleaseSpec};
