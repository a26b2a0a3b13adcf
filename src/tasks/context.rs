//! # Execution context threaded through every task run.
//!
//! [`TaskContext`] carries the three things a task may need while running:
//!
//! - a [`CancellationToken`] for cooperative cancellation and deadlines;
//! - the ambient [`TaskQueue`] handle, so combinators like
//!   [`Task::queue`](crate::Task::queue) can defer work back onto the
//!   worker that is draining them — the handle is an explicit field, not a
//!   keyed lookup in some opaque bag;
//! - caller-attached key/value data for anything request-scoped.
//!
//! Contexts are cheap to clone; derived contexts (`with_value`,
//! `with_timeout`) share the queue handle and value map structurally.

use std::any::Any;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::worker::TaskQueue;

type ValueMap = HashMap<Cow<'static, str>, Arc<dyn Any + Send + Sync>>;

/// Cancellable execution context handed to every [`Task`](crate::Task) run.
#[derive(Clone)]
pub struct TaskContext {
    queue: TaskQueue,
    cancel: CancellationToken,
    values: Arc<ValueMap>,
}

impl TaskContext {
    /// Creates a root context over the given queue and cancellation token.
    pub fn new(queue: TaskQueue, cancel: CancellationToken) -> Self {
        Self {
            queue,
            cancel,
            values: Arc::new(HashMap::new()),
        }
    }

    /// The ambient queue tasks may defer further work onto.
    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    /// The cancellation token governing this run.
    ///
    /// Tasks should check it at natural suspension points and exit promptly
    /// once cancelled; the queue itself enforces no timeouts.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// True once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Returns a derived context carrying an additional named value.
    ///
    /// # Example
    /// ```
    /// use microkern::{TaskContext, TaskQueue};
    /// use tokio_util::sync::CancellationToken;
    ///
    /// let ctx = TaskContext::new(TaskQueue::new(), CancellationToken::new());
    /// let ctx = ctx.with_value("request-id", 42_u64);
    /// assert_eq!(ctx.value::<u64>("request-id").as_deref(), Some(&42));
    /// ```
    pub fn with_value<V>(&self, key: impl Into<Cow<'static, str>>, value: V) -> Self
    where
        V: Any + Send + Sync,
    {
        let mut values: ValueMap = (*self.values).clone();
        values.insert(key.into(), Arc::new(value));
        Self {
            queue: self.queue.clone(),
            cancel: self.cancel.clone(),
            values: Arc::new(values),
        }
    }

    /// Looks up a caller-attached value by key and type.
    pub fn value<V>(&self, key: &str) -> Option<Arc<V>>
    where
        V: Any + Send + Sync,
    {
        self.values
            .get(key)
            .and_then(|v| Arc::clone(v).downcast::<V>().ok())
    }

    /// Returns a derived context whose token is cancelled after `deadline`.
    ///
    /// The parent token still propagates: cancelling the parent cancels the
    /// derived context immediately.
    pub fn with_timeout(&self, deadline: Duration) -> Self {
        let child = self.cancel.child_token();
        let timer = child.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = timer.cancelled() => {}
                _ = tokio::time::sleep(deadline) => timer.cancel(),
            }
        });
        Self {
            queue: self.queue.clone(),
            cancel: child,
            values: Arc::clone(&self.values),
        }
    }
}
