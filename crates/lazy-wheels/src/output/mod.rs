mod plan;
mod progress;
mod release;

pub(crate) use plan::{PlainTextPlanFormatter, PlanFormatter};
pub(crate) use progress::format_progress;
pub(crate) use release::{PlainTextReleaseFormatter, ReleaseFormatter};
