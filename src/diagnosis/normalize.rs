use std::sync::LazyLock;

use regex::Regex;

/// Anything outside lowercase ASCII letters, digits and the plain space.
static RE_DISALLOWED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9 ]").unwrap());
static RE_SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" {2,}").unwrap());

/// Normalize free text for symptom matching.
///
/// Lowercases, replaces every character outside `[a-z0-9 ]` with a space,
/// collapses runs of spaces and trims. Empty input yields an empty string.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let lower = text.to_lowercase();
    let replaced = RE_DISALLOWED.replace_all(&lower, " ");
    RE_SPACES.replace_all(&replaced, " ").trim().to_string()
}
