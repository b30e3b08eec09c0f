mod gh;
mod git;
mod manifest;
pub mod process;
mod project;
mod uv;

pub use gh::GhReleaseHost;
pub use git::Git2Provider;
pub use manifest::FileSystemManifestWriter;
pub use project::FileSystemProjectProvider;
pub use uv::UvBuilder;
