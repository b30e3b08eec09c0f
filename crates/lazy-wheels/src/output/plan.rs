use std::fmt::Write;

use wheels_operations::operations::PlanOutput;

pub(crate) trait PlanFormatter {
    fn format_plan(&self, plan: &PlanOutput) -> String;
}

pub(crate) struct PlainTextPlanFormatter;

impl PlainTextPlanFormatter {
    fn format_changed(out: &mut String, plan: &PlanOutput) {
        let _ = writeln!(out, "Packages to release in {}:", plan.release);
        for name in &plan.changed {
            let since = plan
                .last_tags
                .get(name)
                .and_then(Option::as_deref)
                .map_or_else(|| "never released".to_string(), |tag| format!("since {tag}"));
            let why = plan
                .dirty
                .cause(name)
                .map(ToString::to_string)
                .unwrap_or_default();
            let _ = writeln!(out, "  {name} ({why}, {since})");
        }
    }

    fn format_unchanged(out: &mut String, plan: &PlanOutput) {
        if plan.unchanged.is_empty() {
            return;
        }

        out.push_str("\nUnchanged:\n");
        for name in &plan.unchanged {
            match plan.last_tags.get(name).and_then(Option::as_deref) {
                Some(tag) => {
                    let _ = writeln!(out, "  {name} ({tag})");
                }
                None => {
                    let _ = writeln!(out, "  {name}");
                }
            }
        }
    }
}

impl PlanFormatter for PlainTextPlanFormatter {
    fn format_plan(&self, plan: &PlanOutput) -> String {
        let mut out = String::new();
        Self::format_changed(&mut out, plan);
        Self::format_unchanged(&mut out, plan);
        out
    }
}
