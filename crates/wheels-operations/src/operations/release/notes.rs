use wheels_core::PackageInfo;

use super::data::VersionBump;

/// Markdown body of a release: the packages built in this release with the
/// version they were built at, then the packages carried over unchanged.
#[must_use]
pub fn release_notes(released: &[&PackageInfo], unchanged: &[&str]) -> String {
    let mut lines = Vec::new();

    if !released.is_empty() {
        lines.push("**Released:**".to_string());
        lines.extend(
            released
                .iter()
                .map(|package| format!("- {} {}", package.name, package.version)),
        );
    }

    if !unchanged.is_empty() {
        lines.push(String::new());
        lines.push(format!("**Unchanged:** {}", unchanged.join(", ")));
    }

    lines.join("\n")
}

/// Commit message for the version bump: the configured title, a blank line
/// and one `name: old → new` line per package.
#[must_use]
pub fn bump_commit_message(title: &str, bumps: &[VersionBump]) -> String {
    let summary: Vec<String> = bumps
        .iter()
        .map(|bump| format!("  {}: {} → {}", bump.package, bump.old, bump.new))
        .collect();
    format!("{title}\n\n{}", summary.join("\n"))
}
