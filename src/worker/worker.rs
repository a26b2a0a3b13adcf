//! # Worker: the container-managed drain engine for deferred work.
//!
//! The [`Worker`] owns exactly one priority queue of [`Task`]s, shared by
//! reference with every service that obtained it through injection. It is
//! deployed on first use (any `worker` injection point) and takes part in
//! the kernel lifecycle like any other service.
//!
//! ## Execution modes
//!
//! ```text
//! run phase reached
//!   │
//!   ├─ daemon flag unset ──► one drain pass on the run-phase task,
//!   │                        first task error fails the phase
//!   │
//!   └─ daemon flag set ────► spawn background loop, return immediately
//!                              loop {
//!                                drain pass (errors logged, loop survives)
//!                                queue empty → sleep idle interval
//!                                daemon flag cleared or worker stopped → exit
//!                              }
//! ```
//!
//! Drain passes execute tasks strictly sequentially; a task that blocks
//! blocks the whole pass. Stopping the worker cancels its token, which both
//! ends the background loop and fails any in-flight pass at the next task
//! boundary.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::BoxError;
use crate::inject::{Dep, InjectionPoint};
use crate::kernel::{Runnable, Service, Stoppable};
use crate::tasks::{Task, TaskContext};
use crate::worker::{Daemon, TaskQueue};

/// Interval slept by the daemon loop after a pass that left the queue empty.
const IDLE_INTERVAL: Duration = Duration::from_millis(100);

/// Container-managed owner of the shared deferred-work queue.
pub struct Worker {
    daemon: Dep<Daemon>,
    queue: TaskQueue,
    cancel: CancellationToken,
    idle: Duration,
}

impl Default for Worker {
    fn default() -> Self {
        Self {
            daemon: Dep::new(),
            queue: TaskQueue::new(),
            cancel: CancellationToken::new(),
            idle: IDLE_INTERVAL,
        }
    }
}

impl Worker {
    /// Adds a task with priority 0.
    pub fn add_task(&self, task: Task) -> &Self {
        self.queue.add_task(task);
        self
    }

    /// Adds a task with a specific priority.
    ///
    /// Tasks with a higher priority value will run *after* those with a
    /// lower value.
    pub fn add_priority_task(&self, priority: i32, task: Task) -> &Self {
        self.queue.add_priority_task(priority, task);
        self
    }

    fn context(&self) -> TaskContext {
        TaskContext::new(self.queue.clone(), self.cancel.child_token())
    }
}

impl Service for Worker {
    fn injection_points(&self) -> Vec<InjectionPoint> {
        vec![InjectionPoint::dependency("daemon", &self.daemon)]
    }

    fn as_runnable(&self) -> Option<&dyn Runnable> {
        Some(self)
    }

    fn as_stoppable(&self) -> Option<&dyn Stoppable> {
        Some(self)
    }
}

#[async_trait]
impl Runnable for Worker {
    async fn run(&self) -> Result<(), BoxError> {
        let daemon = Arc::clone(self.daemon.get());
        if daemon.is_daemon() {
            let queue = self.queue.clone();
            let cancel = self.cancel.clone();
            let idle = self.idle;
            tokio::spawn(async move {
                drain_loop(queue, daemon, cancel, idle).await;
            });
            Ok(())
        } else {
            self.queue.drain_pass(&self.context()).await?;
            Ok(())
        }
    }
}

#[async_trait]
impl Stoppable for Worker {
    async fn stop(&self) {
        self.cancel.cancel();
    }
}

/// Continuous background drain loop for daemon mode.
///
/// A task error ends its pass but never the loop; it is logged and the next
/// pass starts. The loop exits once the daemon flag is cleared or the
/// worker's token is cancelled.
async fn drain_loop(
    queue: TaskQueue,
    daemon: Arc<Daemon>,
    cancel: CancellationToken,
    idle: Duration,
) {
    while daemon.is_daemon() && !cancel.is_cancelled() {
        let ctx = TaskContext::new(queue.clone(), cancel.child_token());
        if let Err(err) = queue.drain_pass(&ctx).await {
            tracing::warn!(label = err.as_label(), error = %err, "task failed during drain pass");
        }
        if queue.is_empty() {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(idle) => {}
            }
        }
    }
    tracing::debug!("worker drain loop terminated");
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::error::TaskError;

    fn worker_with_daemon() -> (Worker, Arc<Daemon>) {
        let worker = Worker::default();
        let daemon = Arc::new(Daemon::default());
        worker.daemon.fill(Arc::clone(&daemon));
        (worker, daemon)
    }

    #[tokio::test]
    async fn test_one_shot_run_drains_queue_once() {
        let (worker, _daemon) = worker_with_daemon();
        let order = Arc::new(Mutex::new(Vec::new()));

        for (priority, tag) in [(10, 10), (50, 50), (12, 12)] {
            let order = Arc::clone(&order);
            worker.add_priority_task(
                priority,
                Task::new(move |_ctx| {
                    let order = Arc::clone(&order);
                    async move {
                        order.lock().unwrap().push(tag);
                        Ok(())
                    }
                }),
            );
        }

        worker.run().await.expect("run");
        assert_eq!(*order.lock().unwrap(), vec![10, 12, 50]);
    }

    #[tokio::test]
    async fn test_one_shot_run_surfaces_task_errors() {
        let (worker, _daemon) = worker_with_daemon();
        worker.add_task(Task::new(|_ctx| async {
            Err(TaskError::failed("broken"))
        }));

        let err = worker.run().await.unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[tokio::test]
    async fn test_daemon_run_returns_immediately_and_drains_in_background() {
        let (mut worker, daemon) = worker_with_daemon();
        worker.idle = Duration::from_millis(5);
        daemon.set_daemon();

        let counter = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&counter);
        worker.add_task(Task::new(move |_ctx| {
            let seen = Arc::clone(&seen);
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }));

        worker.run().await.expect("run");

        // the background loop picks the task up shortly after
        tokio::time::timeout(Duration::from_secs(1), async {
            while counter.load(Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("task never ran");

        worker.stop().await;
    }

    #[tokio::test]
    async fn test_queued_task_can_terminate_the_daemon_loop() {
        let (mut worker, daemon) = worker_with_daemon();
        worker.idle = Duration::from_millis(5);
        daemon.set_daemon();

        let switch = Arc::clone(&daemon);
        worker.add_task(Task::new(move |_ctx| {
            let switch = Arc::clone(&switch);
            async move {
                switch.clear_daemon();
                Ok(())
            }
        }));

        worker.run().await.expect("run");

        tokio::time::timeout(Duration::from_secs(1), async {
            while daemon.is_daemon() {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("daemon flag never cleared");
    }

    #[tokio::test]
    async fn test_daemon_loop_survives_task_errors() {
        let (mut worker, daemon) = worker_with_daemon();
        worker.idle = Duration::from_millis(5);
        daemon.set_daemon();

        let counter = Arc::new(AtomicUsize::new(0));
        worker.add_task(Task::new(|_ctx| async {
            Err(TaskError::failed("first pass dies"))
        }));

        worker.run().await.expect("run");

        // work queued after the failure still runs on a later pass
        let seen = Arc::clone(&counter);
        worker.add_task(Task::new(move |_ctx| {
            let seen = Arc::clone(&seen);
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }));

        tokio::time::timeout(Duration::from_secs(1), async {
            while counter.load(Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("loop did not survive the error");

        worker.stop().await;
    }
}
