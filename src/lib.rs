//! # microkern
//!
//! **Microkern** is a minimal application runtime container for Rust.
//!
//! It assembles independently written components ("services") into a single
//! process, resolves their declared dependencies, drives them through a
//! fixed lifecycle, and provides a shared priority-ordered deferred-work
//! queue (the worker) that services use to schedule follow-up work without
//! creating their own concurrency primitives.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │   Service    │   │   Service    │   │   Service    │
//!     │  (root #1)   │   │  (root #2)   │   │ (dependency) │
//!     └──────┬───────┘   └──────┬───────┘   └──────▲───────┘
//!            ▼                  ▼                  │ deployed on demand
//! ┌───────────────────────────────────────────────┴───────────────────┐
//! │  Kernel (service container)                                       │
//! │  - identity index (singleton per identity)                        │
//! │  - in-flight resolution set (cycle detection)                     │
//! │  - injection engine: dependency / flag / config / worker          │
//! │  - lifecycle: Init → PostInit → Start → Run, Stop in reverse      │
//! └──────┬──────────────────────┬───────────────────────┬─────────────┘
//!        ▼                      ▼                       ▼
//!   FlagSet (clap)       DynamicConfig (yaml)      Worker
//!   one Arg per flag     one shared instance       PriorityQueue<Task>
//!   parsed once at       per section name          one-shot drain or
//!   launch                                         daemon drain loop
//! ```
//!
//! ### Lifecycle
//! ```text
//! Kernel::builder().register(root)…  ──►  add_service (DFS over
//!                                          injection points + Init hooks)
//!   launch():
//!     freeze ─► parse flags ─► post-init ─► install signal handler
//!            ─► start (stop guaranteed from here) ─► run ─► stop
//! ```
//!
//! ## Features
//! | Area | Description | Key types / traits |
//! |------|-------------|--------------------|
//! | **Container** | identity-based registration, cycle detection, launch | [`Kernel`], [`KernelBuilder`], [`ServiceId`] |
//! | **Lifecycle** | capability traits a service opts into | [`Service`], [`Initializable`], [`Startable`], [`Stoppable`], [`Runnable`] |
//! | **Injection** | declarative points over shared cells | [`InjectionPoint`], [`Dep`], [`Flag`], [`Section`] |
//! | **Queue** | mutex-guarded priority queue | [`PriorityQueue`] |
//! | **Worker** | drain-once / daemon execution of deferred work | [`Worker`], [`TaskQueue`], [`Daemon`] |
//! | **Tasks** | cancellable, composable units of work | [`Task`], [`TaskContext`], [`OnceFlag`] |
//! | **Config** | YAML sections shared across services | [`DynamicConfig`] |
//! | **Errors** | typed container and task errors | [`KernelError`], [`TaskError`] |
//!
//! ## Example
//! ```no_run
//! use async_trait::async_trait;
//! use microkern::{
//!     BoxError, Dep, Flag, InjectionPoint, Kernel, Runnable, Service, Task, Worker,
//! };
//!
//! #[derive(Default)]
//! struct App {
//!     verbose: Flag<bool>,
//!     worker: Dep<Worker>,
//! }
//!
//! impl Service for App {
//!     fn injection_points(&self) -> Vec<InjectionPoint> {
//!         vec![
//!             InjectionPoint::flag("verbose", &self.verbose)
//!                 .described("Enable verbose output"),
//!             InjectionPoint::worker("worker", &self.worker),
//!         ]
//!     }
//!
//!     fn as_runnable(&self) -> Option<&dyn Runnable> {
//!         Some(self)
//!     }
//! }
//!
//! #[async_trait]
//! impl Runnable for App {
//!     async fn run(&self) -> Result<(), BoxError> {
//!         if *self.verbose.get() {
//!             println!("scheduling deferred work");
//!         }
//!         self.worker.get().add_task(Task::new(|_ctx| async {
//!             println!("deferred hello");
//!             Ok(())
//!         }));
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), BoxError> {
//!     Kernel::builder().register(App::default()).launch().await?;
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod inject;
mod kernel;
mod queue;
mod tasks;
mod worker;

// ---- Public re-exports ----

pub use config::DynamicConfig;
pub use error::{BoxError, KernelError, Phase, TaskError, TaskResult};
pub use inject::{Dep, Directive, Flag, FlagKind, FlagValue, InjectionPoint, Section, Target};
pub use kernel::{
    Initializable, Kernel, KernelBuilder, PostInitializable, Runnable, Service, ServiceId,
    ServiceRef, Startable, Stoppable,
};
pub use queue::PriorityQueue;
pub use tasks::{OnceFlag, Task, TaskContext};
pub use worker::{Daemon, TaskQueue, Worker};
