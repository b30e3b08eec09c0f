use wheels_operations::OperationError;

use crate::error::CliError;

/// How far a failed release got, for the user to decide how to recover.
/// `None` for failures that did not come from a pipeline stage.
pub(crate) fn format_progress(error: &CliError) -> Option<String> {
    let error = error.operation()?;
    let OperationError::StageFailed { stage, source, .. } = error else {
        return None;
    };

    let completed = error.completed_stages();
    let mut out = String::from("\nprogress:\n");
    if completed.is_empty() {
        out.push_str("  completed stages: none\n");
    } else {
        out.push_str(&format!("  completed stages: {}\n", completed.join(", ")));
    }
    out.push_str(&format!("  failed stage: {stage}\n"));

    let tags = error.tags_created();
    if tags.is_empty() {
        out.push_str("  tags created: none\n");
    } else {
        out.push_str(&format!("  tags created: {}\n", tags.join(", ")));
        if matches!(source.as_ref(), OperationError::VcsWrite { .. }) {
            out.push_str("  push the bump commit as shown above instead of rerunning\n");
        } else {
            out.push_str("  manifest edits were reverted; rerunning on this commit reuses these tags\n");
        }
    }
    Some(out)
}
