//! Format Parser (spec §4.1): compiles a `literal <Field1> literal <Field2>`
//! pattern into a matcher that turns a raw line into an ordered set of
//! named fields, or reports no match.
//!
//! Grounded in the original Python `_generate_log_format_regex` /
//! `_log_to_data_frame` (`original_source/.../drain.py`): literal spans are
//! regex-escaped with whitespace runs collapsed to `\s+`, each `<Field>`
//! becomes a non-greedy named capture group, and the whole pattern is
//! anchored.

use crate::error::DrainError;
use regex::Regex;

/// A compiled log format pattern.
#[derive(Debug)]
pub struct LogFormat {
    regex: Regex,
    fields: Vec<String>,
}

impl LogFormat {
    /// Compiles `pattern`. Fails with `InvalidConfiguration` if the pattern
    /// is empty, declares no fields, declares a field name that isn't a
    /// valid identifier, or doesn't declare a `Content` field (spec §3: a
    /// Log Record always has a `Content` field).
    pub fn compile(pattern: &str) -> Result<Self, DrainError> {
        if pattern.trim().is_empty() {
            return Err(DrainError::InvalidConfiguration(
                "log format pattern must not be empty".to_string(),
            ));
        }

        let field_span = Regex::new(r"<([^<>]+)>").expect("static pattern");
        let ident = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static pattern");

        let mut regex_src = String::from("^");
        let mut fields = Vec::new();
        let mut last = 0;

        for m in field_span.find_iter(pattern) {
            regex_src.push_str(&Self::literal_to_regex(&pattern[last..m.start()]));
            let name = &pattern[m.start() + 1..m.end() - 1];
            if !ident.is_match(name) {
                return Err(DrainError::InvalidConfiguration(format!(
                    "field name '{name}' is not a valid identifier"
                )));
            }
            regex_src.push_str(&format!("(?P<{name}>.*?)"));
            fields.push(name.to_string());
            last = m.end();
        }
        regex_src.push_str(&Self::literal_to_regex(&pattern[last..]));
        regex_src.push('$');

        if fields.is_empty() {
            return Err(DrainError::InvalidConfiguration(
                "log format pattern must declare at least one field".to_string(),
            ));
        }
        if !fields.iter().any(|f| f == "Content") {
            return Err(DrainError::InvalidConfiguration(
                "log format pattern must declare a Content field".to_string(),
            ));
        }

        let regex = Regex::new(&regex_src).map_err(|e| {
            DrainError::InvalidConfiguration(format!("failed to compile log format: {e}"))
        })?;

        Ok(Self { regex, fields })
    }

    /// Declared field names, in pattern order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Matches `line`. Returns `None` on *FormatMismatch* (spec §7): the
    /// caller skips the line and does not assign it a `LineId`.
    pub fn parse(&self, line: &str) -> Option<Vec<(String, String)>> {
        let captures = self.regex.captures(line.trim())?;
        let mut out = Vec::with_capacity(self.fields.len());
        for name in &self.fields {
            let value = captures.name(name)?.as_str().to_string();
            out.push((name.clone(), value));
        }
        Some(out)
    }

    /// Regex-escapes a literal span of the pattern, collapsing any
    /// whitespace run into `\s+` so it matches any non-empty run of
    /// whitespace in the input.
    fn literal_to_regex(literal: &str) -> String {
        let ws = Regex::new(r"\s+").expect("static pattern");
        let mut out = String::new();
        let mut last = 0;
        for m in ws.find_iter(literal) {
            out.push_str(&regex::escape(&literal[last..m.start()]));
            out.push_str(r"\s+");
            last = m.end();
        }
        out.push_str(&regex::escape(&literal[last..]));
        out
    }
}
