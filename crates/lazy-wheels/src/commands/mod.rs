mod plan;
mod release;

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use wheels_pipeline::CancellationToken;

use crate::error::Result;

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Build, tag and publish every package that changed since its last release
    Release(ReleaseArgs),
    /// Show which packages a release would rebuild, without changing anything
    Plan(PlanArgs),
}

#[derive(Args)]
pub(crate) struct ReleaseArgs {
    /// Release name (default: the next r<N>)
    #[arg(long)]
    name: Option<String>,

    /// Rebuild every package regardless of changes
    #[arg(long)]
    force_all: bool,

    /// Maximum number of concurrent builds
    #[arg(long, short = 'j', value_parser = clap::value_parser!(u16).range(1..))]
    jobs: Option<u16>,

    /// Release even if the working tree has uncommitted changes
    #[arg(long)]
    allow_dirty: bool,
}

#[derive(Args)]
pub(crate) struct PlanArgs {
    /// Release name to report (default: the next r<N>)
    #[arg(long)]
    name: Option<String>,

    /// Report every package as changed
    #[arg(long)]
    force_all: bool,

    /// Print the plan as JSON
    #[arg(long)]
    json: bool,

    /// Append `key=value` step outputs to this file
    #[arg(long, value_name = "FILE")]
    github_output: Option<PathBuf>,
}

impl Commands {
    pub(crate) fn execute(self, start_path: &Path, cancel: &CancellationToken) -> Result<()> {
        match self {
            Self::Release(args) => release::run(args, start_path, cancel),
            Self::Plan(args) => plan::run(args, start_path),
        }
    }
}
