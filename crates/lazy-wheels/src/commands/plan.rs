use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use wheels_operations::ReleaseRequest;
use wheels_operations::operations::{PlanOperation, PlanOutput};
use wheels_operations::providers::{FileSystemProjectProvider, Git2Provider};

use super::PlanArgs;
use crate::error::{CliError, Result};
use crate::output::{PlainTextPlanFormatter, PlanFormatter};

pub(crate) fn run(args: PlanArgs, start_path: &Path) -> Result<()> {
    let operation = PlanOperation::new(FileSystemProjectProvider::new(), Git2Provider::new());
    let request = ReleaseRequest {
        start_path: start_path.to_path_buf(),
        release_name: args.name,
        force_all: args.force_all,
        ..ReleaseRequest::default()
    };
    let plan = operation.execute(&request)?;

    if let Some(path) = &args.github_output {
        append_step_outputs(path, &plan)?;
    }

    if args.json {
        println!("{}", plan.to_json()?);
    } else {
        print!("{}", PlainTextPlanFormatter.format_plan(&plan));
    }

    Ok(())
}

/// CI runners hand every step the same output file, so lines are appended.
fn append_step_outputs(path: &Path, plan: &PlanOutput) -> Result<()> {
    let lines = plan.github_output()?;
    let write_error = |source| CliError::WriteOutput {
        path: path.to_path_buf(),
        source,
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(write_error)?;
    file.write_all(lines.as_bytes()).map_err(write_error)
}
