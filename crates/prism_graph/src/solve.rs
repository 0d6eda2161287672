// SPDX-License-Identifier: MIT OR Apache-2.0
//! Topological ordering over the node and edge tables.
//!
//! Depth-first search driven by an explicit frame stack, so ordering depth
//! is bounded by the heap rather than the call stack. The search emits a
//! reverse postorder, which places every producer ahead of its consumers.

use crate::edge::{Edge, EdgeId};
use crate::graph::NodeId;
use indexmap::IndexMap;

/// Error when the edge set contains a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("graph contains a cycle")]
pub struct CycleError;

/// Visit state of a node within one ordering pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    Visiting,
    Finished,
}

/// Compute a topological order of `nodes` under `edges`.
///
/// Returns node ids with producers before consumers. All traversal state
/// is local to the call: the adjacency list and visit table are rebuilt
/// from the current tables every time, so nothing here can go stale
/// between solves.
///
/// The order is deterministic for a given mutation history. Roots are
/// taken in node insertion order and out-edges in edge table order.
pub(crate) fn topological_order<T>(
    nodes: &IndexMap<NodeId, T>,
    edges: &IndexMap<EdgeId, Edge>,
) -> Result<Vec<NodeId>, CycleError> {
    let node_count = nodes.len();

    // Adjacency over dense node positions. Duplicate edges between the
    // same pair are kept; revisiting a finished node is a no-op.
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    for edge in edges.values() {
        let (Some(from), Some(to)) = (
            nodes.get_index_of(&edge.from),
            nodes.get_index_of(&edge.to),
        ) else {
            // Nodes are append-only, so an unresolvable endpoint means the
            // handle came from a different graph. Skip the edge.
            continue;
        };
        adjacency[from].push(to);
    }

    let mut state = vec![Visit::Unvisited; node_count];
    let mut postorder: Vec<usize> = Vec::with_capacity(node_count);
    // Each frame is (node position, cursor into its out-edge list).
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for root in 0..node_count {
        if state[root] != Visit::Unvisited {
            continue;
        }
        state[root] = Visit::Visiting;
        stack.push((root, 0));

        while let Some((node, cursor)) = stack.pop() {
            if let Some(&next) = adjacency[node].get(cursor) {
                stack.push((node, cursor + 1));
                match state[next] {
                    Visit::Unvisited => {
                        state[next] = Visit::Visiting;
                        stack.push((next, 0));
                    }
                    // An edge back into the active path: not a DAG.
                    Visit::Visiting => return Err(CycleError),
                    Visit::Finished => {}
                }
            } else {
                state[node] = Visit::Finished;
                postorder.push(node);
            }
        }
    }

    let ids: Vec<NodeId> = nodes.keys().copied().collect();
    Ok(postorder.iter().rev().map(|&position| ids[position]).collect())
}
