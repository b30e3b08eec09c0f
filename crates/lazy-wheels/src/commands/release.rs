use std::path::Path;

use tracing::debug;
use wheels_operations::ReleaseRequest;
use wheels_operations::operations::ReleaseOperation;
use wheels_operations::providers::{
    FileSystemManifestWriter, FileSystemProjectProvider, GhReleaseHost, Git2Provider, UvBuilder,
};
use wheels_operations::traits::ProjectProvider;
use wheels_pipeline::CancellationToken;

use super::ReleaseArgs;
use crate::error::Result;
use crate::output::{PlainTextReleaseFormatter, ReleaseFormatter};

pub(crate) fn run(args: ReleaseArgs, start_path: &Path, cancel: &CancellationToken) -> Result<()> {
    let project_provider = FileSystemProjectProvider::new();
    let workspace = project_provider.discover_workspace(start_path)?;
    let config = project_provider.load_config(&workspace)?;
    debug!(root = %workspace.root.display(), "configuring providers");

    let git_provider = Git2Provider::new().with_push_timeout(config.network_timeout());
    let builder = UvBuilder::new(
        config.build_command(),
        &workspace.root,
        config.build_timeout(),
    );
    let release_host = GhReleaseHost::new(&workspace.root, config.network_timeout());

    let operation = ReleaseOperation::new(
        project_provider,
        git_provider,
        FileSystemManifestWriter::new(),
        builder,
        release_host,
    );
    let request = ReleaseRequest {
        start_path: start_path.to_path_buf(),
        release_name: args.name,
        force_all: args.force_all,
        allow_dirty: args.allow_dirty,
        build_jobs: args.jobs.map(usize::from),
    };
    let output = operation.execute(request, cancel)?;

    print!("{}", PlainTextReleaseFormatter.format_release(&output));

    Ok(())
}
