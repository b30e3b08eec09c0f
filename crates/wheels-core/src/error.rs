use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid package tag '{tag}': expected '<name>/v<major>.<minor>.<patch>'")]
    InvalidPackageTag { tag: String },

    #[error("invalid release name '{name}': expected '<prefix><number>'")]
    InvalidReleaseName { name: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
