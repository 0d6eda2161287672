// SPDX-License-Identifier: MIT OR Apache-2.0
//! Edge (directed connection) records for the dependency graph.

use crate::graph::NodeId;
use serde::{Deserialize, Serialize};

/// Unique identifier for an edge
///
/// Edge ids come from a counter that never recycles a value, so a handle
/// kept across a removal stays detectably stale instead of aliasing a
/// newer edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub(crate) u32);

impl EdgeId {
    /// Get the raw id value
    pub fn index(self) -> u32 {
        self.0
    }
}

/// A directed edge between two nodes
///
/// The edge points from producer to consumer: a solved graph orders
/// `from` strictly before `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Source node
    pub from: NodeId,
    /// Destination node
    pub to: NodeId,
}

impl Edge {
    /// Check whether this edge matches the given endpoint criteria
    ///
    /// A `None` endpoint matches any node.
    pub fn matches(&self, from: Option<NodeId>, to: Option<NodeId>) -> bool {
        from.map_or(true, |node| node == self.from) && to.map_or(true, |node| node == self.to)
    }
}
