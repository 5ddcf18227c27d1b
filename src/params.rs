//! Parameter Extractor (spec §4.8): given a matched template and the
//! original content, recovers the substring each wildcard stood for.
//!
//! Grounded directly in the original Python `_get_parameter_list`
//! (`original_source/.../drain.py`): the template is escaped character by
//! character (not with a wholesale `regex::escape`, so that the reserved
//! wildcard marker survives escaping intact as a recognizable substring),
//! runs of escaped spaces are collapsed to `\s+` so the pattern tolerates
//! the same whitespace variation the Preprocessor does, and every
//! wildcard is replaced with a non-greedy capture group.

use regex::Regex;

use crate::drain::WILDCARD;

/// Builds the capture regex for `template` and extracts one value per
/// wildcard from `content`. Returns an empty list if the template has no
/// wildcards, or if `content` doesn't actually match the template.
pub fn extract(template: &str, content: &str) -> Vec<String> {
    match compile(template) {
        Some(regex) => extract_with(&regex, content),
        None => Vec::new(),
    }
}

/// Compiles the capture regex for `template`, or `None` if it carries no
/// wildcard at all. Split out from [`extract`] so a caller mining many
/// lines against a handful of recurring templates can cache the compiled
/// regex per template instead of rebuilding it on every line.
pub fn compile(template: &str) -> Option<Regex> {
    if !template.contains(WILDCARD) {
        return None;
    }
    Regex::new(&to_capture_regex(template)).ok()
}

/// Extracts parameters from `content` using an already-compiled regex.
pub fn extract_with(regex: &Regex, content: &str) -> Vec<String> {
    match regex.captures(content) {
        Some(captures) => captures
            .iter()
            .skip(1)
            .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
            .collect(),
        None => Vec::new(),
    }
}

/// Escapes every non-alphanumeric character one at a time (mirroring the
/// original's char-by-char escape rather than a block-level `regex::escape`),
/// then collapses escaped-space runs to `\s+` and swaps each escaped
/// wildcard marker for a non-greedy capture group.
fn to_capture_regex(template: &str) -> String {
    let mut escaped = String::with_capacity(template.len() * 2);
    for c in template.chars() {
        if c.is_alphanumeric() || c == '_' {
            escaped.push(c);
        } else {
            escaped.push('\\');
            escaped.push(c);
        }
    }

    let space_runs = Regex::new(r"(?:\\ )+").expect("static pattern");
    let collapsed = space_runs.replace_all(&escaped, r"\s+");

    let escaped_wildcard: String = WILDCARD.chars().fold(String::new(), |mut acc, c| {
        acc.push('\\');
        acc.push(c);
        acc
    });
    let with_groups = collapsed.replace(&escaped_wildcard, "(.*?)");

    format!("^{with_groups}$")
}
