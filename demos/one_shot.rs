//! # Example: one_shot
//!
//! Minimal example of a service scheduling deferred work on the shared
//! worker, drained once during the run phase.
//!
//! Demonstrates how to:
//! - Declare injection points for a flag and the worker.
//! - Queue prioritized tasks from a Start hook.
//! - Let the kernel drive the full lifecycle to completion.
//!
//! ## Flow
//! ```text
//! Kernel::builder().register(Greeter) ──► launch()
//!     ├─► inject: --count flag, Worker (deploys Worker + Daemon)
//!     ├─► parse flags
//!     ├─► Greeter::start()  — queues tasks
//!     ├─► Worker::run()     — one drain pass, priority order
//!     └─► stop sequence
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example one_shot -- --count 3
//! ```

use async_trait::async_trait;
use microkern::{BoxError, Dep, Flag, InjectionPoint, Kernel, Service, Startable, Task, Worker};

#[derive(Default)]
struct Greeter {
    count: Flag<i64>,
    worker: Dep<Worker>,
}

impl Service for Greeter {
    fn injection_points(&self) -> Vec<InjectionPoint> {
        vec![
            InjectionPoint::flag("count", &self.count)
                .described("How many greetings to queue")
                .with_default("2"),
            InjectionPoint::worker("worker", &self.worker),
        ]
    }

    fn as_startable(&self) -> Option<&dyn Startable> {
        Some(self)
    }
}

#[async_trait]
impl Startable for Greeter {
    async fn start(&self) -> Result<(), BoxError> {
        let worker = self.worker.get();
        for i in 1..=*self.count.get() {
            worker.add_priority_task(
                i as i32,
                Task::new(move |_ctx| async move {
                    println!("[greeter] hello #{i}");
                    Ok(())
                }),
            );
        }
        // runs first despite being queued last
        worker.add_priority_task(
            0,
            Task::new(|_ctx| async {
                println!("[greeter] queue opened");
                Ok(())
            }),
        );
        Ok(())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    Kernel::builder().register(Greeter::default()).launch().await?;
    println!("[kernel] lifecycle complete");
    Ok(())
}
