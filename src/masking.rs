//! Masking and preprocessing.
//!
//! `LogMasker` is the ambient, named-mask layer (grounded in the teacher's
//! `masking.rs`): each instruction replaces every match of a pattern with
//! `<mask_name>`, e.g. `<NUM>` or `<IP>`, letting a caller pre-wildcard
//! sensitive values while keeping them distinguishable in the mined
//! template. The teacher builds its instructions on `fancy_regex`, used
//! there only for its `\1`-style backreference support in an exact-match
//! mode this crate doesn't need; this module uses plain `regex` instead
//! (dropped in DESIGN.md).
//!
//! `Preprocessor` is spec §4.2 itself: an ordered list of plain regexes,
//! each substituted with the literal reserved wildcard token `<*>`. It is
//! built as a `LogMasker` whose every instruction masks to `*` with prefix
//! `<` / suffix `>`, so the substitution lands on the reserved vocabulary
//! (spec §6) exactly.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::drain::WILDCARD;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MaskingInstructionConfig {
    pub pattern: String,
    pub mask_with: String,
}

pub trait AbstractMaskingInstruction {
    fn pattern(&self) -> &str;
    fn mask_with(&self) -> &str;
}

pub struct MaskingInstruction {
    pattern: String,
    mask_with: String,
}

impl MaskingInstruction {
    pub fn new(config: &MaskingInstructionConfig) -> Self {
        Self {
            pattern: config.pattern.clone(),
            mask_with: config.mask_with.clone(),
        }
    }
}

impl AbstractMaskingInstruction for MaskingInstruction {
    fn pattern(&self) -> &str {
        &self.pattern
    }

    fn mask_with(&self) -> &str {
        &self.mask_with
    }
}

/// Applies an ordered list of masking instructions, each wrapping its match
/// in `mask_prefix`/`mask_suffix` around its mask name.
pub struct LogMasker {
    instructions: Vec<(Regex, String)>,
    pub mask_prefix: String,
    pub mask_suffix: String,
}

impl LogMasker {
    pub fn new(
        instructions: Vec<Box<dyn AbstractMaskingInstruction>>,
        mask_prefix: &str,
        mask_suffix: &str,
    ) -> Self {
        let compiled = instructions
            .iter()
            .map(|i| {
                let regex = Regex::new(i.pattern())
                    .unwrap_or_else(|e| panic!("invalid masking pattern '{}': {e}", i.pattern()));
                (regex, i.mask_with().to_string())
            })
            .collect();

        Self {
            instructions: compiled,
            mask_prefix: mask_prefix.to_string(),
            mask_suffix: mask_suffix.to_string(),
        }
    }

    fn from_compiled(instructions: Vec<(Regex, String)>, mask_prefix: &str, mask_suffix: &str) -> Self {
        Self {
            instructions,
            mask_prefix: mask_prefix.to_string(),
            mask_suffix: mask_suffix.to_string(),
        }
    }

    pub fn mask(&self, content: &str) -> String {
        let mut masked = content.to_string();
        for (regex, mask_with) in &self.instructions {
            let replacement = format!("{}{}{}", self.mask_prefix, mask_with, self.mask_suffix);
            masked = regex.replace_all(&masked, replacement.as_str()).into_owned();
        }
        masked
    }

    pub fn mask_names(&self) -> Vec<String> {
        self.instructions.iter().map(|(_, name)| name.clone()).collect()
    }
}

/// The Preprocessor (spec §4.2): substitutes every match of an ordered list
/// of regexes with the literal wildcard token, then strips and splits the
/// result on whitespace to produce a token sequence.
pub struct Preprocessor {
    masker: LogMasker,
}

impl Preprocessor {
    pub fn new(regexes: &[String]) -> Result<Self, regex::Error> {
        let compiled = regexes
            .iter()
            .map(|pattern| Regex::new(pattern).map(|regex| (regex, "*".to_string())))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            masker: LogMasker::from_compiled(compiled, "<", ">"),
        })
    }

    /// Applies the substitutions, then strips and splits on whitespace.
    pub fn tokenize(&self, content: &str) -> Vec<String> {
        let masked = self.masker.mask(content);
        masked
            .trim()
            .split_whitespace()
            .map(|s| s.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preprocessor_replaces_matches_with_wildcard() {
        let pre = Preprocessor::new(&[r"\d+".to_string()]).unwrap();
        assert_eq!(
            pre.tokenize("user 123 logged in"),
            vec!["user", WILDCARD, "logged", "in"]
        );
    }

    #[test]
    fn preprocessor_applies_regexes_in_order() {
        let pre = Preprocessor::new(&["foo".to_string(), r"<\*> bar".to_string()]).unwrap();
        assert_eq!(pre.tokenize("foo bar baz"), vec![WILDCARD, "baz"]);
    }

    #[test]
    fn empty_regex_list_just_tokenizes() {
        let pre = Preprocessor::new(&[]).unwrap();
        assert_eq!(pre.tokenize("  a   b  c "), vec!["a", "b", "c"]);
    }

    #[test]
    fn named_mask_round_trip() {
        let instructions: Vec<Box<dyn AbstractMaskingInstruction>> =
            vec![Box::new(MaskingInstruction::new(&MaskingInstructionConfig {
                pattern: r"\d+".to_string(),
                mask_with: "NUM".to_string(),
            }))];
        let masker = LogMasker::new(instructions, "<", ">");
        assert_eq!(masker.mask("user 123 logged in"), "user <NUM> logged in");
    }
}
