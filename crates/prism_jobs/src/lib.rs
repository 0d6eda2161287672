// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed render tasks and present-job ordering.
//!
//! A [`Job`] collects units of render work ([`Task`] implementations)
//! and wires their typed ports together. Every connection is both a data
//! route and a dependency edge in a [`prism_graph::Graph`], so the job
//! can hand back its tasks in execution order: producers strictly before
//! consumers, cycles reported instead of submitted.
//!
//! The intended use is build-then-sort. A frame setup registers tasks
//! with [`Job::add_task`], wires them with [`Job::connect`], marks the
//! final image with [`Job::set_presentable_output`], and then calls
//! [`Job::sorted_tasks`] each time it needs the submission order. The
//! order is cached between mutations.
//!
//! Tasks are shared through [`std::sync::Arc`] and must be `Send + Sync`:
//! jobs are typically assembled on a build thread and drained on the
//! submission thread.

pub mod connection;
pub mod job;
pub mod task;

pub use connection::{ConnectionId, TaskConnection};
pub use job::{Job, JobError, PresentableOutput};
pub use task::{Port, PortType, Task, TaskId};
