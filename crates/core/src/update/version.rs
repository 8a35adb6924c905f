//! Version comparison for update availability

use semver::Version;

/// Parses a version string, tolerating the shapes release tooling tends to
/// emit: a leading `v`, and missing minor/patch components (`2.1` is `2.1.0`).
/// Returns `None` for anything else that isn't semver.
pub fn parse_lenient(raw: &str) -> Option<Version> {
    let raw = raw.trim();
    let raw = raw
        .strip_prefix('v')
        .or_else(|| raw.strip_prefix('V'))
        .unwrap_or(raw);

    let split_at = raw.find(['-', '+']).unwrap_or(raw.len());
    let (core, suffix) = raw.split_at(split_at);

    let parts: Vec<&str> = core.split('.').collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }
    let mut numbers = [0u64; 3];
    for (slot, part) in numbers.iter_mut().zip(&parts) {
        *slot = part.parse().ok()?;
    }

    Version::parse(&format!(
        "{}.{}.{}{}",
        numbers[0], numbers[1], numbers[2], suffix
    ))
    .ok()
}

/// `true` only when `candidate` is strictly newer than `current`.
/// Unparseable versions on either side never report an update.
pub fn is_newer(candidate: &str, current: &str) -> bool {
    match (parse_lenient(candidate), parse_lenient(current)) {
        (Some(candidate), Some(current)) => candidate > current,
        _ => false,
    }
}
