pub mod error;
mod name;
mod tag;
pub mod types;

pub use error::*;
pub use name::canonicalize_name;
pub use tag::{PackageTag, ReleaseName};
pub use types::*;
