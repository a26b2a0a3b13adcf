//! Shared worker daemon and its task queue.

mod daemon;
mod queue;
#[allow(clippy::module_inception)]
mod worker;

pub use daemon::Daemon;
pub use queue::TaskQueue;
pub use worker::Worker;
