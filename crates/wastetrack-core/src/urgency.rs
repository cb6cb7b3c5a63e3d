//! Urgency classification and tier ordering keys.

use std::cmp::{Ordering, Reverse};

use serde::{Deserialize, Serialize};

use crate::models::Node;

/// Priority partition of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Fill level reached or exceeded the urgency limit
    Urgent,
    Normal,
}

/// A node is urgent once its fill level reaches its limit (inclusive).
pub fn is_urgent(node: &Node) -> bool {
    node.fill_level >= node.urgency_limit
}

pub fn tier_of(node: &Node) -> Tier {
    if is_urgent(node) {
        Tier::Urgent
    } else {
        Tier::Normal
    }
}

/// Ordering key shared by both tiers: descending fill level, then id.
pub fn urgency_key(node: &Node) -> (Reverse<u8>, &str) {
    (Reverse(node.fill_level), node.id.as_str())
}

/// Compare two nodes by [`urgency_key`].
pub fn compare_urgency(a: &Node, b: &Node) -> Ordering {
    urgency_key(a).cmp(&urgency_key(b))
}
