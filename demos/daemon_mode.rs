//! # Example: daemon_mode
//!
//! Continuous background draining: a service flips the daemon flag during
//! start, the worker keeps draining on a background task while the run
//! phase proceeds, and a queued task eventually clears the flag to wind the
//! loop down.
//!
//! ## Flow
//! ```text
//! Pacer::start()          — set_daemon(), queue ticks
//! Worker::run()           — daemon flag set → spawn drain loop, return
//! Pacer::run()            — waits while ticks execute in the background
//! tick #5                 — clear_daemon() → loop exits after this pass
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example daemon_mode
//! ```

use std::time::Duration;

use async_trait::async_trait;
use microkern::{
    BoxError, Daemon, Dep, InjectionPoint, Kernel, Runnable, Service, Startable, Task, Worker,
};

#[derive(Default)]
struct Pacer {
    daemon: Dep<Daemon>,
    worker: Dep<Worker>,
}

impl Service for Pacer {
    fn injection_points(&self) -> Vec<InjectionPoint> {
        vec![
            InjectionPoint::dependency("daemon", &self.daemon),
            InjectionPoint::worker("worker", &self.worker),
        ]
    }

    fn as_startable(&self) -> Option<&dyn Startable> {
        Some(self)
    }

    fn as_runnable(&self) -> Option<&dyn Runnable> {
        Some(self)
    }
}

#[async_trait]
impl Startable for Pacer {
    async fn start(&self) -> Result<(), BoxError> {
        self.daemon.get().set_daemon();

        for i in 1..=5_u32 {
            let daemon = std::sync::Arc::clone(self.daemon.get());
            self.worker.get().add_task(Task::new(move |_ctx| {
                let daemon = std::sync::Arc::clone(&daemon);
                async move {
                    println!("[pacer] tick #{i}");
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    if i == 5 {
                        println!("[pacer] asking the drain loop to wind down");
                        daemon.clear_daemon();
                    }
                    Ok(())
                }
            }));
        }
        Ok(())
    }
}

#[async_trait]
impl Runnable for Pacer {
    async fn run(&self) -> Result<(), BoxError> {
        // the worker's drain loop runs in the background; wait for the
        // queued ticks to clear the daemon flag
        while self.daemon.get().is_daemon() {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        println!("[pacer] daemon flag cleared, run phase ends");
        Ok(())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    Kernel::builder().register(Pacer::default()).launch().await?;
    println!("[kernel] lifecycle complete");
    Ok(())
}
