mod error;
mod reader;
mod requirement;
mod writer;

pub use error::{ManifestError, RequirementError};
pub use reader::{
    ProjectManifest, WorkspaceManifest, read_document, read_project, read_version,
    read_workspace,
};
pub use requirement::Requirement;
pub use writer::{verify_version, write_dependency_pin, write_dependency_pins, write_version};
