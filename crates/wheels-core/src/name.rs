/// Normalizes a distribution name: lowercase, with every run of `-`, `_` and
/// `.` collapsed into a single `-`.
#[must_use]
pub fn canonicalize_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut in_separator_run = false;

    for ch in name.trim().chars() {
        if matches!(ch, '-' | '_' | '.') {
            if !in_separator_run {
                normalized.push('-');
                in_separator_run = true;
            }
        } else {
            normalized.extend(ch.to_lowercase());
            in_separator_run = false;
        }
    }

    normalized
}
