// SPDX-License-Identifier: MIT OR Apache-2.0
//! Generic dependency graph with cached topological ordering.
//!
//! This crate is the ordering core of the Prism renderer. It stores
//! opaque values as nodes, directed edges as dependencies, and hands back
//! the values sorted so that every producer comes before its consumers.
//!
//! Solving is deferred: mutations only mark the graph dirty, and the
//! order is recomputed by the next [`Graph::sorted_values`] call. A graph
//! is typically built once per frame setup and queried many times, so the
//! cache makes the hot path a slice borrow. Cycles are reported as
//! [`CycleError`] and leave the previously cached order intact.
//!
//! ```
//! use prism_graph::Graph;
//!
//! let mut graph = Graph::new();
//! let shadow = graph.add_node("shadow");
//! let scene = graph.add_node("scene");
//! let post = graph.add_node("post");
//! graph.add_edge(shadow, scene);
//! graph.add_edge(scene, post);
//!
//! assert_eq!(graph.sorted_values()?, ["shadow", "scene", "post"]);
//! # Ok::<(), prism_graph::CycleError>(())
//! ```

pub mod edge;
pub mod graph;
mod solve;

pub use edge::{Edge, EdgeId};
pub use graph::{Graph, GraphError, NodeId};
pub use solve::CycleError;
