// SPDX-License-Identifier: MIT OR Apache-2.0
//! Jobs: task registration, typed wiring, and execution ordering.

use crate::connection::{ConnectionId, TaskConnection};
use crate::task::{PortType, Task, TaskId};
use indexmap::IndexMap;
use prism_graph::{CycleError, Graph, NodeId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Error when assembling or ordering a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum JobError {
    /// The task id is not part of this job
    #[error("task not found: {0:?}")]
    TaskNotFound(TaskId),
    /// The output port index is out of range
    #[error("task {task:?} has no output {index}")]
    OutputNotFound {
        /// Task the lookup was made on
        task: TaskId,
        /// Requested output index
        index: usize,
    },
    /// The input port index is out of range
    #[error("task {task:?} has no input {index}")]
    InputNotFound {
        /// Task the lookup was made on
        task: TaskId,
        /// Requested input index
        index: usize,
    },
    /// Connected ports must carry exactly the same type
    #[error("cannot connect {from:?} output to {to:?} input")]
    TypeMismatch {
        /// Type of the producing output
        from: PortType,
        /// Type of the consuming input
        to: PortType,
    },
    /// The presentable output must be texture-like
    #[error("output {index} of task {task:?} cannot be presented")]
    NotPresentable {
        /// Task the output belongs to
        task: TaskId,
        /// Rejected output index
        index: usize,
    },
    /// The task dependencies contain a cycle
    #[error(transparent)]
    Cycle(#[from] CycleError),
}

/// The designated final output of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentableOutput {
    /// Task producing the final image
    pub task: TaskId,
    /// Output index on that task
    pub output: usize,
}

/// A registered task and its node in the dependency graph
#[derive(Debug, Clone)]
struct TaskEntry {
    task: Arc<dyn Task>,
    node: NodeId,
}

/// A render job: tasks wired through typed connections, sorted on demand.
///
/// A job owns its tasks via [`Arc`], so the caller may keep handles to
/// them after registration. Connections carry data between ports and
/// double as dependency edges; [`Job::sorted_tasks`] returns the tasks in
/// an order where every producer runs before its consumers.
///
/// Every connection request is validated in full before anything is
/// recorded, so a failed call leaves the job exactly as it was.
#[derive(Debug, Clone)]
pub struct Job {
    /// Job name for logs and diagnostics
    label: String,
    /// Dependency graph over task ids
    graph: Graph<TaskId>,
    /// Registered tasks by id
    tasks: IndexMap<TaskId, TaskEntry>,
    /// Typed connections by id
    connections: IndexMap<ConnectionId, TaskConnection>,
    /// Designated final output, if any
    presentable: Option<PresentableOutput>,
}

impl Job {
    /// Create an empty job with the given label
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            graph: Graph::new(),
            tasks: IndexMap::new(),
            connections: IndexMap::new(),
            presentable: None,
        }
    }

    /// Get the job label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Register a task and return its id
    ///
    /// The job keeps its own reference; the caller's `Arc` stays valid.
    pub fn add_task(&mut self, task: Arc<dyn Task>) -> TaskId {
        let id = TaskId(self.tasks.len() as u32);
        let node = self.graph.add_node(id);
        tracing::trace!("job '{}': added task '{}' as {:?}", self.label, task.label(), id);
        self.tasks.insert(id, TaskEntry { task, node });
        id
    }

    /// Connect an output port of one task to an input port of another
    ///
    /// Both tasks must be registered, both port indices must resolve, and
    /// the port types must match exactly. Validation runs before any
    /// mutation, so on error neither a connection nor a dependency edge is
    /// recorded. The same output may feed any number of inputs.
    pub fn connect(
        &mut self,
        from: TaskId,
        from_output: usize,
        to: TaskId,
        to_input: usize,
    ) -> Result<ConnectionId, JobError> {
        let from_entry = self.tasks.get(&from).ok_or(JobError::TaskNotFound(from))?;
        let to_entry = self.tasks.get(&to).ok_or(JobError::TaskNotFound(to))?;

        let output = from_entry.task.output(from_output).ok_or(JobError::OutputNotFound {
            task: from,
            index: from_output,
        })?;
        let input = to_entry.task.input(to_input).ok_or(JobError::InputNotFound {
            task: to,
            index: to_input,
        })?;

        if output.port_type != input.port_type {
            return Err(JobError::TypeMismatch {
                from: output.port_type,
                to: input.port_type,
            });
        }

        let from_node = from_entry.node;
        let to_node = to_entry.node;
        self.graph.add_edge(from_node, to_node);

        let id = ConnectionId(self.connections.len() as u32);
        self.connections.insert(
            id,
            TaskConnection {
                from_task: from,
                from_output,
                to_task: to,
                to_input,
            },
        );
        tracing::trace!(
            "job '{}': connected {:?} output {} to {:?} input {}",
            self.label,
            from,
            from_output,
            to,
            to_input
        );
        Ok(id)
    }

    /// Designate the output port whose result is presented to the screen
    ///
    /// The output must exist and carry a texture-like type. Setting a new
    /// presentable output replaces the previous designation; on error the
    /// previous designation is kept.
    pub fn set_presentable_output(&mut self, task: TaskId, output: usize) -> Result<(), JobError> {
        let entry = self.tasks.get(&task).ok_or(JobError::TaskNotFound(task))?;
        let port = entry
            .task
            .output(output)
            .ok_or(JobError::OutputNotFound { task, index: output })?;
        if !port.port_type.is_presentable() {
            return Err(JobError::NotPresentable { task, index: output });
        }
        self.presentable = Some(PresentableOutput { task, output });
        tracing::debug!(
            "job '{}': presentable output is {:?} output {}",
            self.label,
            task,
            output
        );
        Ok(())
    }

    /// Get the designated presentable output, if one was set
    pub fn presentable_output(&self) -> Option<PresentableOutput> {
        self.presentable
    }

    /// Get the tasks in dependency order, re-solving first if needed
    ///
    /// Producers come before consumers. Repeated calls without
    /// intervening mutations reuse the cached order.
    pub fn sorted_tasks(&mut self) -> Result<Vec<Arc<dyn Task>>, JobError> {
        let order = self.graph.sorted_values()?;
        Ok(order.iter().map(|id| Arc::clone(&self.tasks[id].task)).collect())
    }

    /// Get a registered task by id
    pub fn task(&self, id: TaskId) -> Option<&Arc<dyn Task>> {
        self.tasks.get(&id).map(|entry| &entry.task)
    }

    /// Iterate over all tasks in registration order
    pub fn tasks(&self) -> impl Iterator<Item = &Arc<dyn Task>> {
        self.tasks.values().map(|entry| &entry.task)
    }

    /// Iterate over all task ids in registration order
    pub fn task_ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.tasks.keys().copied()
    }

    /// Get a connection record by id
    pub fn connection(&self, id: ConnectionId) -> Option<&TaskConnection> {
        self.connections.get(&id)
    }

    /// Iterate over all connection records in creation order
    pub fn connections(&self) -> impl Iterator<Item = &TaskConnection> {
        self.connections.values()
    }

    /// Iterate over the connections touching a task at either end
    pub fn connections_for_task(&self, task: TaskId) -> impl Iterator<Item = &TaskConnection> + '_ {
        self.connections
            .values()
            .filter(move |connection| connection.involves_task(task))
    }

    /// Number of registered tasks
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Number of connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Whether the next sorted query has to re-solve
    pub fn is_dirty(&self) -> bool {
        self.graph.is_dirty()
    }
}

impl Default for Job {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Port;

    #[derive(Debug)]
    struct StubTask {
        label: String,
        inputs: Vec<Port>,
        outputs: Vec<Port>,
    }

    impl StubTask {
        fn new(label: &str, inputs: Vec<Port>, outputs: Vec<Port>) -> Arc<Self> {
            Arc::new(Self {
                label: label.to_string(),
                inputs,
                outputs,
            })
        }
    }

    impl Task for StubTask {
        fn label(&self) -> &str {
            &self.label
        }

        fn inputs(&self) -> &[Port] {
            &self.inputs
        }

        fn outputs(&self) -> &[Port] {
            &self.outputs
        }
    }

    fn tex(name: &str) -> Port {
        Port::new(name, PortType::Texture)
    }

    fn buf(name: &str) -> Port {
        Port::new(name, PortType::Buffer)
    }

    fn labels(tasks: &[Arc<dyn Task>]) -> Vec<&str> {
        tasks.iter().map(|task| task.label()).collect()
    }

    /// geometry -> blur, geometry -> composite, blur -> composite
    fn diamond_job() -> (Job, TaskId, TaskId, TaskId) {
        let mut job = Job::new("diamond");
        let geometry = job.add_task(StubTask::new("geometry", vec![], vec![tex("color")]));
        let blur = job.add_task(StubTask::new("blur", vec![tex("src")], vec![tex("blurred")]));
        let composite = job.add_task(StubTask::new(
            "composite",
            vec![tex("base"), tex("overlay")],
            vec![tex("frame")],
        ));
        job.connect(geometry, 0, blur, 0).unwrap();
        job.connect(geometry, 0, composite, 0).unwrap();
        job.connect(blur, 0, composite, 1).unwrap();
        (job, geometry, blur, composite)
    }

    #[test]
    fn test_ids_are_assigned_in_registration_order() {
        let (job, geometry, blur, composite) = diamond_job();
        assert_eq!(geometry.index(), 0);
        assert_eq!(blur.index(), 1);
        assert_eq!(composite.index(), 2);
        assert_eq!(job.task_count(), 3);
        assert_eq!(job.connection_count(), 3);
        assert_eq!(
            job.tasks().map(|task| task.label()).collect::<Vec<_>>(),
            ["geometry", "blur", "composite"]
        );
        assert_eq!(
            job.connections().map(|c| (c.from_task, c.to_task)).collect::<Vec<_>>(),
            vec![(geometry, blur), (geometry, composite), (blur, composite)]
        );
    }

    #[test]
    fn test_sorted_tasks_put_producers_first() {
        let (mut job, _, _, _) = diamond_job();
        let order = job.sorted_tasks().unwrap();
        assert_eq!(labels(&order), ["geometry", "blur", "composite"]);
    }

    #[test]
    fn test_sorted_tasks_are_cached_until_mutation() {
        let (mut job, geometry, _, _) = diamond_job();
        let first = labels(&job.sorted_tasks().unwrap())
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>();
        assert!(!job.is_dirty());
        let second = labels(&job.sorted_tasks().unwrap())
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>();
        assert_eq!(first, second);

        let debug = job.add_task(StubTask::new("debug", vec![tex("view")], vec![]));
        assert!(job.is_dirty());
        job.connect(geometry, 0, debug, 0).unwrap();
        let order = job.sorted_tasks().unwrap();
        assert_eq!(order.len(), 4);
        assert!(!job.is_dirty());
    }

    #[test]
    fn test_connect_rejects_type_mismatch() {
        let mut job = Job::new("mismatch");
        let producer = job.add_task(StubTask::new("producer", vec![], vec![tex("color")]));
        let consumer = job.add_task(StubTask::new("consumer", vec![buf("lights")], vec![]));
        job.sorted_tasks().unwrap();
        assert!(!job.is_dirty());

        assert_eq!(
            job.connect(producer, 0, consumer, 0),
            Err(JobError::TypeMismatch {
                from: PortType::Texture,
                to: PortType::Buffer,
            })
        );
        assert_eq!(job.connection_count(), 0);
        // A recorded edge would have marked the job dirty.
        assert!(!job.is_dirty());
    }

    #[test]
    fn test_connect_rejects_unknown_tasks_and_ports() {
        let mut job = Job::new("validate");
        let producer = job.add_task(StubTask::new("producer", vec![], vec![tex("color")]));
        let consumer = job.add_task(StubTask::new("consumer", vec![tex("src")], vec![]));
        let ghost = TaskId(7);

        assert_eq!(
            job.connect(ghost, 0, consumer, 0),
            Err(JobError::TaskNotFound(ghost))
        );
        assert_eq!(
            job.connect(producer, 0, ghost, 0),
            Err(JobError::TaskNotFound(ghost))
        );
        assert_eq!(
            job.connect(producer, 1, consumer, 0),
            Err(JobError::OutputNotFound {
                task: producer,
                index: 1,
            })
        );
        assert_eq!(
            job.connect(producer, 0, consumer, 3),
            Err(JobError::InputNotFound {
                task: consumer,
                index: 3,
            })
        );
        assert_eq!(job.connection_count(), 0);
    }

    #[test]
    fn test_presentable_output_must_be_texture_like() {
        let mut job = Job::new("present");
        let task = job.add_task(StubTask::new(
            "final",
            vec![],
            vec![buf("stats"), tex("frame")],
        ));

        assert_eq!(
            job.set_presentable_output(task, 0),
            Err(JobError::NotPresentable { task, index: 0 })
        );
        assert_eq!(job.presentable_output(), None);

        job.set_presentable_output(task, 1).unwrap();
        assert_eq!(
            job.presentable_output(),
            Some(PresentableOutput { task, output: 1 })
        );
    }

    #[test]
    fn test_presentable_output_accepts_texture_views_and_replaces() {
        let mut job = Job::new("present");
        let first = job.add_task(StubTask::new("first", vec![], vec![tex("frame")]));
        let second = job.add_task(StubTask::new(
            "second",
            vec![],
            vec![Port::new("frame", PortType::TextureView)],
        ));

        job.set_presentable_output(first, 0).unwrap();
        job.set_presentable_output(second, 0).unwrap();
        assert_eq!(
            job.presentable_output(),
            Some(PresentableOutput {
                task: second,
                output: 0,
            })
        );
    }

    #[test]
    fn test_presentable_output_validates_task_and_index() {
        let mut job = Job::new("present");
        let task = job.add_task(StubTask::new("final", vec![], vec![tex("frame")]));
        let ghost = TaskId(9);

        assert_eq!(
            job.set_presentable_output(ghost, 0),
            Err(JobError::TaskNotFound(ghost))
        );
        assert_eq!(
            job.set_presentable_output(task, 5),
            Err(JobError::OutputNotFound { task, index: 5 })
        );
        assert_eq!(job.presentable_output(), None);
    }

    #[test]
    fn test_cyclic_dependencies_fail_to_sort() {
        let mut job = Job::new("cycle");
        let a = job.add_task(StubTask::new("a", vec![tex("in")], vec![tex("out")]));
        let b = job.add_task(StubTask::new("b", vec![tex("in")], vec![tex("out")]));
        job.connect(a, 0, b, 0).unwrap();
        job.connect(b, 0, a, 0).unwrap();

        assert!(matches!(job.sorted_tasks(), Err(JobError::Cycle(_))));
        assert!(job.is_dirty());
    }

    #[test]
    fn test_one_output_may_feed_many_inputs() {
        let mut job = Job::new("fanout");
        let producer = job.add_task(StubTask::new("producer", vec![], vec![tex("color")]));
        let left = job.add_task(StubTask::new("left", vec![tex("src")], vec![]));
        let right = job.add_task(StubTask::new("right", vec![tex("src")], vec![]));

        let first = job.connect(producer, 0, left, 0).unwrap();
        let second = job.connect(producer, 0, right, 0).unwrap();
        assert_eq!(first.index(), 0);
        assert_eq!(second.index(), 1);

        let order = job.sorted_tasks().unwrap();
        assert_eq!(order.len(), 3);
        assert_eq!(order[0].label(), "producer");
    }

    #[test]
    fn test_connection_lookup() {
        let (job, geometry, blur, composite) = diamond_job();
        let record = job.connection(ConnectionId(0)).unwrap();
        assert_eq!(record.from_task, geometry);
        assert_eq!(record.from_output, 0);
        assert_eq!(record.to_task, blur);
        assert_eq!(record.to_input, 0);
        assert!(job.connection(ConnectionId(99)).is_none());

        assert_eq!(job.connections_for_task(blur).count(), 2);
        assert_eq!(job.connections_for_task(geometry).count(), 2);
        assert_eq!(job.connections_for_task(composite).count(), 2);
    }

    #[test]
    fn test_tasks_are_shared_not_moved() {
        let task = StubTask::new("standalone", vec![], vec![tex("color")]);
        assert_eq!(Arc::strong_count(&task), 1);

        let mut job = Job::new("ownership");
        let id = job.add_task(task.clone());
        assert_eq!(Arc::strong_count(&task), 2);
        assert_eq!(job.task(id).unwrap().label(), "standalone");

        drop(job);
        assert_eq!(Arc::strong_count(&task), 1);
    }

    #[test]
    fn test_empty_job_sorts_empty() {
        let mut job = Job::default();
        assert_eq!(job.label(), "Untitled");
        assert!(job.sorted_tasks().unwrap().is_empty());
        assert_eq!(job.task_ids().count(), 0);
    }
}
