// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection records between task ports.

use crate::task::TaskId;
use serde::{Deserialize, Serialize};

/// Unique identifier for a connection within a job
///
/// Connections are append-only, so ids are dense table indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(pub(crate) u32);

impl ConnectionId {
    /// Get the raw id value
    pub fn index(self) -> u32 {
        self.0
    }
}

/// A typed connection from one task's output to another task's input.
///
/// Each connection is recorded alongside a dependency edge in the job's
/// graph. Jobs are built once and sorted many times, so connections are
/// never removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskConnection {
    /// Producing task
    pub from_task: TaskId,
    /// Output index on the producing task
    pub from_output: usize,
    /// Consuming task
    pub to_task: TaskId,
    /// Input index on the consuming task
    pub to_input: usize,
}

impl TaskConnection {
    /// Check if this connection involves a specific task at either end
    pub fn involves_task(&self, task: TaskId) -> bool {
        self.from_task == task || self.to_task == task
    }
}
