// SPDX-License-Identifier: MIT OR Apache-2.0
//! Render task abstraction and its typed ports.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a task within a job
///
/// Tasks are append-only, so ids are dense table indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(pub(crate) u32);

impl TaskId {
    /// Get the raw id value
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Type of object carried by a task port
///
/// Port compatibility is exact tag equality; there are no implicit
/// conversions between port types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortType {
    /// 2D texture object
    Texture,
    /// View over a texture subresource
    TextureView,
    /// Generic GPU buffer
    Buffer,
    /// Texture sampler state
    Sampler,
    /// Vertex and index data
    Geometry,
    /// Scene slice to draw
    Scene,
    /// Camera parameters
    Camera,
}

impl PortType {
    /// Whether an output of this type can be presented to the screen
    ///
    /// Only texture-like outputs qualify; everything else stays internal
    /// to the job.
    pub fn is_presentable(self) -> bool {
        matches!(self, Self::Texture | Self::TextureView)
    }
}

/// A named, typed input or output slot on a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    /// Port name
    pub name: String,
    /// Type of data flowing through the port
    pub port_type: PortType,
}

impl Port {
    /// Create a new port
    pub fn new(name: impl Into<String>, port_type: PortType) -> Self {
        Self {
            name: name.into(),
            port_type,
        }
    }
}

/// A unit of render work with declared data dependencies.
///
/// Implementations come from the graphics backend; the job layer only
/// reads the port declarations and never executes anything itself. Port
/// lists must stay fixed for the lifetime of the task, since connections
/// refer to ports by index. Tasks are shared through [`std::sync::Arc`]
/// and may cross from a build thread to the submission thread, hence the
/// `Send + Sync` bound.
pub trait Task: fmt::Debug + Send + Sync {
    /// Short name used in logs and diagnostics
    fn label(&self) -> &str;

    /// Input ports, in declaration order
    fn inputs(&self) -> &[Port];

    /// Output ports, in declaration order
    fn outputs(&self) -> &[Port];

    /// Get an input port by index
    fn input(&self, index: usize) -> Option<&Port> {
        self.inputs().get(index)
    }

    /// Get an output port by index
    fn output(&self, index: usize) -> Option<&Port> {
        self.outputs().get(index)
    }
}
