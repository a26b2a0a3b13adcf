//! # Task abstraction and structural composition.
//!
//! A [`Task`] is a unit of deferred, cancellable, fallible work: an async
//! closure of a [`TaskContext`] yielding a [`TaskResult`]. Tasks are cheap
//! cloneable handles, so one task value can sit on a queue and inside a
//! combinator chain at the same time.
//!
//! ## Composition
//!
//! Control flow is built structurally instead of ad hoc:
//!
//! | Combinator | Behavior |
//! |------------|----------|
//! | [`Task::then`] | sequential, success-dependent chaining |
//! | [`Task::defer`] | always-run cleanup regardless of outcome |
//! | [`Task::on_error`] | handle an ordinary failure, carrying the error |
//! | [`Task::on_abort`] | handle an abnormal termination the same way |
//! | [`Task::guard`] | suppress every failure mode |
//! | [`Task::run_once`] | single-fire gating keyed by an [`OnceFlag`] |
//! | [`Task::queue`] | defer execution onto the ambient worker queue |
//!
//! Abnormal termination is the [`TaskError::Aborted`] result variant, so
//! `on_abort` and `guard` are ordinary pattern matches — nothing here
//! intercepts unwinding.
//!
//! # Example
//! ```
//! use microkern::{Task, TaskError};
//!
//! let work = Task::new(|_ctx| async { Ok(()) })
//!     .then(Task::new(|_ctx| async { Err(TaskError::failed("late")) }))
//!     .guard();
//! # drop(work);
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::{TaskError, TaskResult};
use crate::tasks::{OnceFlag, TaskContext};

type TaskFuture = Pin<Box<dyn Future<Output = TaskResult> + Send>>;
type TaskFn = dyn Fn(TaskContext) -> TaskFuture + Send + Sync;

/// Deferred, cancellable, fallible unit of work.
#[derive(Clone)]
pub struct Task {
    inner: Arc<TaskFn>,
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task").finish_non_exhaustive()
    }
}

impl Task {
    /// Creates a task from an async closure.
    ///
    /// The closure is invoked once per run and receives the ambient
    /// [`TaskContext`]; implementations should observe
    /// [`TaskContext::is_cancelled`] at natural suspension points.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(TaskContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TaskResult> + Send + 'static,
    {
        let inner: Arc<TaskFn> =
            Arc::new(move |ctx: TaskContext| -> TaskFuture { Box::pin(f(ctx)) });
        Self { inner }
    }

    /// A task that does nothing and succeeds.
    pub fn noop() -> Self {
        Self::new(|_ctx| async { Ok(()) })
    }

    /// Executes the task.
    pub async fn run(&self, ctx: TaskContext) -> TaskResult {
        (self.inner)(ctx).await
    }

    /// Chains `next` to run after this task succeeds.
    ///
    /// A failure of this task short-circuits: `next` never runs and the
    /// error propagates unchanged.
    pub fn then(self, next: Task) -> Task {
        Task::new(move |ctx| {
            let first = self.clone();
            let second = next.clone();
            async move {
                first.run(ctx.clone()).await?;
                second.run(ctx).await
            }
        })
    }

    /// Runs `cleanup` after this task, regardless of its outcome.
    ///
    /// The primary error wins; the cleanup result is only surfaced when the
    /// primary task succeeded. The moral equivalent of scoped resource
    /// release.
    pub fn defer(self, cleanup: Task) -> Task {
        Task::new(move |ctx| {
            let primary = self.clone();
            let cleanup = cleanup.clone();
            async move {
                let outcome = primary.run(ctx.clone()).await;
                let released = cleanup.run(ctx).await;
                match outcome {
                    Err(e) => Err(e),
                    Ok(()) => released,
                }
            }
        })
    }

    /// Branches to `handler` when this task fails with an ordinary error.
    ///
    /// The handler receives the failure as an explicit argument and its own
    /// result becomes the outcome. Aborts and cancellation pass through
    /// untouched.
    pub fn on_error<F, Fut>(self, handler: F) -> Task
    where
        F: Fn(TaskContext, TaskError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TaskResult> + Send + 'static,
    {
        let handler = Arc::new(handler);
        Task::new(move |ctx| {
            let task = self.clone();
            let handler = Arc::clone(&handler);
            async move {
                match task.run(ctx.clone()).await {
                    Err(err @ TaskError::Failed(_)) => handler(ctx, err).await,
                    other => other,
                }
            }
        })
    }

    /// Branches to `handler` when this task terminates abnormally.
    ///
    /// Converts an [`TaskError::Aborted`] outcome into a normal task
    /// invocation carrying the failure; ordinary errors and cancellation
    /// pass through untouched.
    pub fn on_abort<F, Fut>(self, handler: F) -> Task
    where
        F: Fn(TaskContext, TaskError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TaskResult> + Send + 'static,
    {
        let handler = Arc::new(handler);
        Task::new(move |ctx| {
            let task = self.clone();
            let handler = Arc::clone(&handler);
            async move {
                match task.run(ctx.clone()).await {
                    Err(err @ TaskError::Aborted(_)) => handler(ctx, err).await,
                    other => other,
                }
            }
        })
    }

    /// Suppresses every failure mode of this task.
    ///
    /// Used when a task's failure must never halt the surrounding drain
    /// pass.
    pub fn guard(self) -> Task {
        Task::new(move |ctx| {
            let task = self.clone();
            async move {
                let _ = task.run(ctx).await;
                Ok(())
            }
        })
    }

    /// Gates this task behind `gate`: the first run executes, every later
    /// run is a successful no-op.
    pub fn run_once(self, gate: &OnceFlag) -> Task {
        let gate = gate.clone();
        Task::new(move |ctx| {
            let task = self.clone();
            let gate = gate.clone();
            async move {
                if gate.fire() {
                    task.run(ctx).await
                } else {
                    Ok(())
                }
            }
        })
    }

    /// Defers this task onto the ambient worker queue at priority 0.
    ///
    /// Running the returned task does not execute `self`; it enqueues it on
    /// [`TaskContext::queue`] and succeeds immediately.
    pub fn queue(self) -> Task {
        self.queue_with_priority(0)
    }

    /// Defers this task onto the ambient worker queue with a priority.
    pub fn queue_with_priority(self, priority: i32) -> Task {
        Task::new(move |ctx| {
            let task = self.clone();
            async move {
                ctx.queue().add_priority_task(priority, task);
                Ok(())
            }
        })
    }
}
