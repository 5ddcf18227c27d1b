//! Log clusters: a template plus the set of line ids it covers (spec §3).

use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Outcome of feeding a line into the Drain tree, grounded in the teacher's
/// `UpdateType` (kept as-is, including its `strum`-derived `Display`).
///
/// This tracks the *insertion event*, not cluster state directly: `Created`
/// is the fresh→created transition, `Updated` is a fresh/refined cluster
/// whose template gained a wildcard from this line, `None` is a member that
/// matched without changing the template at all.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum UpdateType {
    None,
    Created,
    Updated,
}

/// A log cluster: an immutable-length template plus the ordered list of
/// `LineId`s assigned to it. `member_ids` is always non-empty and strictly
/// increasing (spec §5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogCluster {
    pub template: Vec<String>,
    pub member_ids: Vec<usize>,
}

impl LogCluster {
    pub fn new(template: Vec<String>, first_line_id: usize) -> Self {
        Self {
            template,
            member_ids: vec![first_line_id],
        }
    }

    pub fn get_template(&self) -> String {
        self.template.join(" ")
    }

    /// True once the template has accrued at least one wildcard position
    /// and a second member, i.e. it has transitioned out of the *fresh*
    /// state (spec §4.6 state machine).
    pub fn is_refined(&self) -> bool {
        self.member_ids.len() > 1 && self.template.iter().any(|t| t == crate::drain::WILDCARD)
    }
}

impl std::fmt::Display for LogCluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "size={:<10}: {}",
            self.member_ids.len(),
            self.get_template()
        )
    }
}
