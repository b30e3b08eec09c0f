use std::fmt::Write;

use wheels_operations::operations::ReleaseOutput;

pub(crate) trait ReleaseFormatter {
    fn format_release(&self, output: &ReleaseOutput) -> String;
}

pub(crate) struct PlainTextReleaseFormatter;

impl PlainTextReleaseFormatter {
    fn format_header(out: &mut String, output: &ReleaseOutput) {
        match &output.url {
            Some(url) => {
                let _ = writeln!(out, "Published release {}: {url}", output.release);
            }
            None => {
                let _ = writeln!(out, "Published release {}", output.release);
            }
        }
    }

    fn format_bumps(out: &mut String, output: &ReleaseOutput) {
        if output.bumps.is_empty() {
            return;
        }

        out.push_str("\nReleased:\n");
        for bump in &output.bumps {
            let _ = writeln!(out, "  {} {} (next: {})", bump.package, bump.old, bump.new);
        }
    }

    fn format_unchanged(out: &mut String, output: &ReleaseOutput) {
        if output.unchanged.is_empty() {
            return;
        }

        out.push_str("\nUnchanged:\n");
        for name in &output.unchanged {
            let _ = writeln!(out, "  {name}");
        }
    }

    fn format_tags(out: &mut String, output: &ReleaseOutput) {
        if output.tags.is_empty() {
            return;
        }

        out.push_str("\nTags:\n");
        for tag in &output.tags {
            let note = if tag.created { "" } else { " (existing)" };
            let _ = writeln!(out, "  {}{note}", tag.name);
        }
    }
}

impl ReleaseFormatter for PlainTextReleaseFormatter {
    fn format_release(&self, output: &ReleaseOutput) -> String {
        let mut out = String::new();
        Self::format_header(&mut out, output);
        Self::format_bumps(&mut out, output);
        Self::format_unchanged(&mut out, output);
        Self::format_tags(&mut out, output);

        let _ = writeln!(out, "\nArtifacts: {}", output.artifacts.len());
        if let Some(commit) = &output.commit {
            let short = commit.get(..7).unwrap_or(commit);
            let _ = writeln!(out, "Commit: {short}");
        }
        if !output.stage_summary.is_empty() {
            let _ = writeln!(out, "\nStages:\n{}", output.stage_summary);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use semver::Version;
    use wheels_operations::operations::{TagOutcome, VersionBump};

    use super::*;

    fn bump(package: &str, old: &str, new: &str) -> VersionBump {
        VersionBump {
            package: package.to_string(),
            manifest_path: PathBuf::from(format!("/ws/packages/{package}/pyproject.toml")),
            old: Version::parse(old).expect("valid version"),
            new: Version::parse(new).expect("valid version"),
        }
    }

    fn sample_output() -> ReleaseOutput {
        ReleaseOutput {
            release: "r3".to_string(),
            url: Some("https://github.com/acme/mono/releases/tag/r3".to_string()),
            bumps: vec![bump("beta", "2.1.0", "2.1.1"), bump("gamma", "1.2.0", "1.2.1")],
            unchanged: vec!["alpha".to_string()],
            tags: vec![
                TagOutcome {
                    name: "beta/v2.1.0".to_string(),
                    created: false,
                },
                TagOutcome {
                    name: "gamma/v1.2.0".to_string(),
                    created: true,
                },
            ],
            artifacts: vec![PathBuf::from("dist/a.whl"), PathBuf::from("dist/b.whl")],
            commit: Some("0123456789abcdef".to_string()),
            stage_summary: "✓ discover\n✓ push".to_string(),
        }
    }

    #[test]
    fn lists_released_packages_with_next_versions() {
        let text = PlainTextReleaseFormatter.format_release(&sample_output());

        assert!(text.starts_with("Published release r3: https://github.com/acme/mono/releases/tag/r3\n"));
        assert!(text.contains("  beta 2.1.0 (next: 2.1.1)\n"));
        assert!(text.contains("  gamma 1.2.0 (next: 1.2.1)\n"));
        assert!(text.contains("Unchanged:\n  alpha\n"));
    }

    #[test]
    fn marks_reused_tags() {
        let text = PlainTextReleaseFormatter.format_release(&sample_output());

        assert!(text.contains("  beta/v2.1.0 (existing)\n"));
        assert!(text.contains("  gamma/v1.2.0\n"));
    }

    #[test]
    fn shortens_commit_and_appends_stages() {
        let text = PlainTextReleaseFormatter.format_release(&sample_output());

        assert!(text.contains("Artifacts: 2\n"));
        assert!(text.contains("Commit: 0123456\n"));
        assert!(text.ends_with("Stages:\n✓ discover\n✓ push\n"));
    }

    #[test]
    fn omits_empty_sections() {
        let output = ReleaseOutput {
            url: None,
            unchanged: Vec::new(),
            commit: None,
            ..sample_output()
        };

        let text = PlainTextReleaseFormatter.format_release(&output);

        assert!(text.starts_with("Published release r3\n"));
        assert!(!text.contains("Unchanged"));
        assert!(!text.contains("Commit"));
    }
}
