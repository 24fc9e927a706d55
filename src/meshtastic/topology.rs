//! Set reconciliation between two successive topology snapshots.

use serde::Serialize;
use std::collections::BTreeSet;

use super::info::TopologySnapshot;

/// Node ids that joined or left the mesh between two polls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopologyDiff {
    pub added: BTreeSet<String>,
    pub removed: BTreeSet<String>,
}

impl TopologyDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Compare two id sets. The local node's own id is never reported as added;
/// when it is unknown nothing is excluded.
pub fn diff_topology(
    previous: &BTreeSet<String>,
    current: &BTreeSet<String>,
    own_id: Option<&str>,
) -> TopologyDiff {
    let added = current
        .difference(previous)
        .filter(|id| Some(id.as_str()) != own_id)
        .cloned()
        .collect();
    let removed = previous.difference(current).cloned().collect();
    TopologyDiff { added, removed }
}

/// Diff a fresh snapshot against the previous one, if any.
pub fn diff_snapshots(previous: Option<&TopologySnapshot>, current: &TopologySnapshot) -> TopologyDiff {
    let previous_ids = previous.map(TopologySnapshot::node_ids).unwrap_or_default();
    let own_id = current.own_id();
    diff_topology(&previous_ids, &current.node_ids(), own_id.as_deref())
}
