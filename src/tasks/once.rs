//! Shared single-fire gate used by [`Task::run_once`](crate::Task::run_once).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable one-shot gate.
///
/// The first caller of [`OnceFlag::fire`] wins; every later call (from any
/// clone) observes the gate as already fired. Used to make a queued task
/// idempotent when several code paths may enqueue it.
#[derive(Clone, Debug, Default)]
pub struct OnceFlag(Arc<AtomicBool>);

impl OnceFlag {
    /// Creates an unfired gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to fire the gate; true exactly once.
    pub fn fire(&self) -> bool {
        !self.0.swap(true, Ordering::SeqCst)
    }

    /// True once the gate has fired.
    pub fn is_fired(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
