//! # Shared enqueue handle over the worker's priority queue.
//!
//! [`TaskQueue`] is the only surface other code gets for scheduling
//! deferred work: it forwards `add_task` / `add_priority_task` to the
//! underlying [`PriorityQueue`] and never exposes the queue object itself.
//! Handles are cheap clones over one shared queue, which is what makes a
//! dependency-injected worker reference and the context threaded through a
//! drain pass observe the same backlog.

use std::sync::Arc;

use crate::error::{TaskError, TaskResult};
use crate::queue::PriorityQueue;
use crate::tasks::{Task, TaskContext};

/// Cloneable enqueue handle shared by every worker reference.
#[derive(Clone, Default)]
pub struct TaskQueue {
    tasks: Arc<PriorityQueue<Task>>,
}

impl TaskQueue {
    /// Creates a handle over a fresh, empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a task with priority 0.
    pub fn add_task(&self, task: Task) -> &Self {
        self.tasks.add(task);
        self
    }

    /// Adds a task with a specific priority.
    ///
    /// Tasks with a higher priority value will run *after* those with a
    /// lower value.
    pub fn add_priority_task(&self, priority: i32, task: Task) -> &Self {
        self.tasks.add_priority(priority, task);
        self
    }

    /// True when no tasks are queued right now.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Runs one drain pass: pops and executes tasks sequentially until the
    /// queue is empty or a task fails.
    ///
    /// Tasks enqueued by a running task are processed in the same pass. A
    /// cancelled context fails the pass with [`TaskError::Canceled`] before
    /// the next task starts.
    pub(crate) async fn drain_pass(&self, ctx: &TaskContext) -> TaskResult {
        self.tasks
            .drain(|task| {
                let ctx = ctx.clone();
                async move {
                    if ctx.is_cancelled() {
                        return Err(TaskError::Canceled);
                    }
                    task.run(ctx).await
                }
            })
            .await
    }
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue")
            .field("len", &self.tasks.len())
            .finish()
    }
}
