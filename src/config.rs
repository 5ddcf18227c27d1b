//! Configuration for a template-mining run (spec §4.9), grounded in the
//! teacher's `config.rs`: per-field `#[serde(default = "fn")]` plus a
//! hand-written `Default` impl, loaded from TOML via `toml::from_str`.
//!
//! Dropped from the teacher's field set: `drain_max_clusters` (LRU
//! eviction of clusters isn't part of this spec), `drain_extra_delimiters`
//! (a pre-tokenization concept the spec doesn't name; its job is covered
//! by `preprocess_regexes` below), and `parametrize_numeric_tokens` (spec
//! §4.3 step 3's digit heuristic is unconditional — it names no config
//! escape hatch, so this crate doesn't offer one). See DESIGN.md.

use serde::{Deserialize, Serialize};

use crate::masking::MaskingInstructionConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateMinerConfig {
    #[serde(default = "default_engine")]
    pub engine: String,
    #[serde(default = "default_drain_depth")]
    pub drain_depth: usize,
    #[serde(default = "default_drain_sim_th")]
    pub drain_sim_th: f64,
    #[serde(default = "default_drain_max_children")]
    pub drain_max_children: usize,
    #[serde(default = "default_mask_prefix")]
    pub mask_prefix: String,
    #[serde(default = "default_mask_suffix")]
    pub mask_suffix: String,
    #[serde(default = "default_parameter_extraction_cache_capacity")]
    pub parameter_extraction_cache_capacity: usize,
    /// Ordered regexes substituted with the reserved wildcard before
    /// tokenization (spec §4.2 Preprocessor).
    #[serde(default)]
    pub preprocess_regexes: Vec<String>,
    /// Named masking instructions applied before the Preprocessor
    /// (teacher's `LogMasker`, spec §4.9 ambient masking layer).
    #[serde(default)]
    pub masking_instructions: Vec<MaskingInstructionConfig>,
    #[serde(default = "default_snapshot_interval_minutes")]
    pub snapshot_interval_minutes: u64,
}

fn default_engine() -> String {
    "Drain".to_string()
}
fn default_drain_depth() -> usize {
    4
}
fn default_drain_sim_th() -> f64 {
    0.4
}
fn default_drain_max_children() -> usize {
    100
}
fn default_mask_prefix() -> String {
    "<".to_string()
}
fn default_mask_suffix() -> String {
    ">".to_string()
}
fn default_parameter_extraction_cache_capacity() -> usize {
    3000
}
fn default_snapshot_interval_minutes() -> u64 {
    1
}

impl Default for TemplateMinerConfig {
    fn default() -> Self {
        Self {
            engine: default_engine(),
            drain_depth: default_drain_depth(),
            drain_sim_th: default_drain_sim_th(),
            drain_max_children: default_drain_max_children(),
            mask_prefix: default_mask_prefix(),
            mask_suffix: default_mask_suffix(),
            parameter_extraction_cache_capacity: default_parameter_extraction_cache_capacity(),
            preprocess_regexes: vec![],
            masking_instructions: vec![],
            snapshot_interval_minutes: default_snapshot_interval_minutes(),
        }
    }
}

impl TemplateMinerConfig {
    pub fn load(path: &str) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        toml::from_str(&content).ok()
    }
}
