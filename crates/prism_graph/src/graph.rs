// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure and the operations to build and query it.

use crate::edge::{Edge, EdgeId};
use crate::solve::{self, CycleError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Unique identifier for a node
///
/// Nodes are append-only, so ids are dense table indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Get the raw id value
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Error for structural edge operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// The edge handle does not refer to a live edge
    #[error("edge not found: {0:?}")]
    EdgeNotFound(EdgeId),
    /// An endpoint query was given no endpoints at all
    #[error("edge query needs at least one endpoint")]
    NoEndpoints,
    /// Bulk edge removal takes exactly one endpoint
    #[error("bulk edge removal takes exactly one endpoint")]
    BothEndpoints,
}

/// A directed graph of opaque values with a cached topological order.
///
/// The graph stores values without interpreting them. Every mutation
/// marks the graph dirty; the order is recomputed lazily by the next
/// [`Graph::sorted_values`] call. A solve that fails on a cycle leaves
/// the previous order in place, so callers keep a usable result while
/// they repair the edges.
#[derive(Debug, Clone)]
pub struct Graph<T> {
    /// Node values by id, in insertion order
    nodes: IndexMap<NodeId, T>,
    /// Live edges by id
    edges: IndexMap<EdgeId, Edge>,
    /// Next edge id, never reused after a removal
    next_edge: u32,
    /// Whether the cached order is out of date
    dirty: bool,
    /// Values in topological order, valid while `dirty` is false
    sorted: Vec<T>,
}

impl<T> Graph<T> {
    /// Create an empty graph
    ///
    /// An empty graph starts clean: its cached order is the empty list,
    /// which is already correct.
    pub fn new() -> Self {
        Self {
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
            next_edge: 0,
            dirty: false,
            sorted: Vec::new(),
        }
    }

    /// Add a node holding `value` and return its id
    pub fn add_node(&mut self, value: T) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.insert(id, value);
        self.dirty = true;
        id
    }

    /// Add a directed edge from `from` to `to` and return its id
    ///
    /// Endpoints are not validated here. An edge whose endpoint does not
    /// resolve at solve time is skipped by the ordering pass. Parallel
    /// edges between the same pair are allowed and are removed
    /// independently.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) -> EdgeId {
        let id = EdgeId(self.next_edge);
        self.next_edge += 1;
        self.edges.insert(id, Edge { from, to });
        self.dirty = true;
        id
    }

    /// Remove the edge with the given id, returning its endpoints
    pub fn remove_edge(&mut self, id: EdgeId) -> Result<Edge, GraphError> {
        let edge = self
            .edges
            .swap_remove(&id)
            .ok_or(GraphError::EdgeNotFound(id))?;
        self.dirty = true;
        Ok(edge)
    }

    /// Remove every edge touching one endpoint
    ///
    /// Exactly one of `from` and `to` must be given; the other side is
    /// left unconstrained. Returns whether any edge was removed. When
    /// nothing matches, the cached order is left as it was.
    pub fn remove_edges(
        &mut self,
        from: Option<NodeId>,
        to: Option<NodeId>,
    ) -> Result<bool, GraphError> {
        match (from, to) {
            (None, None) => return Err(GraphError::NoEndpoints),
            (Some(_), Some(_)) => return Err(GraphError::BothEndpoints),
            _ => {}
        }
        let before = self.edges.len();
        self.edges.retain(|_, edge| !edge.matches(from, to));
        let removed = self.edges.len() != before;
        if removed {
            self.dirty = true;
        }
        Ok(removed)
    }

    /// Find the ids of all edges matching the given endpoints
    ///
    /// At least one endpoint must be given; a `None` side matches any
    /// node. Ids come back in edge table order.
    pub fn find_edges(
        &self,
        from: Option<NodeId>,
        to: Option<NodeId>,
    ) -> Result<Vec<EdgeId>, GraphError> {
        if from.is_none() && to.is_none() {
            return Err(GraphError::NoEndpoints);
        }
        Ok(self
            .edges
            .iter()
            .filter(|(_, edge)| edge.matches(from, to))
            .map(|(id, _)| *id)
            .collect())
    }

    /// Check whether any edge matches the given endpoints
    ///
    /// At least one endpoint must be given.
    pub fn has_edges(&self, from: Option<NodeId>, to: Option<NodeId>) -> Result<bool, GraphError> {
        if from.is_none() && to.is_none() {
            return Err(GraphError::NoEndpoints);
        }
        Ok(self.edges.values().any(|edge| edge.matches(from, to)))
    }

    /// Get the endpoints of an edge
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    /// Get the value stored in a node
    pub fn value(&self, id: NodeId) -> Option<&T> {
        self.nodes.get(&id)
    }

    /// Iterate over all node values in insertion order
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.nodes.values()
    }

    /// Iterate over all node ids in insertion order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Number of nodes in the graph
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of live edges in the graph
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Whether the next sorted query has to re-solve
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl<T: Clone> Graph<T> {
    /// Recompute the cached topological order
    ///
    /// On success the cache holds every value with producers ahead of
    /// consumers and the graph is clean. On a cycle the cache and the
    /// dirty flag are untouched.
    pub fn solve(&mut self) -> Result<(), CycleError> {
        let order = solve::topological_order(&self.nodes, &self.edges)?;
        self.sorted = order.into_iter().map(|id| self.nodes[&id].clone()).collect();
        self.dirty = false;
        tracing::trace!(
            "solved order for {} nodes, {} edges",
            self.nodes.len(),
            self.edges.len()
        );
        Ok(())
    }

    /// Get the values in topological order, re-solving first if needed
    ///
    /// Repeated calls without intervening mutations return the cached
    /// order without re-solving.
    pub fn sorted_values(&mut self) -> Result<&[T], CycleError> {
        if self.dirty {
            self.solve()?;
        }
        Ok(&self.sorted)
    }
}

impl<T> Default for Graph<T> {
    fn default() -> Self {
        Self::new()
    }
}
