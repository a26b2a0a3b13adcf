//! # Mutex-guarded priority queue.
//!
//! [`PriorityQueue`] keeps entries ordered by `(priority ascending,
//! insertion order ascending)` — lower priority values are popped first,
//! and entries with equal priority preserve arrival order.
//!
//! Insertion is linear in queue length. Queues are expected to be
//! short-lived, per-cycle structures, not long-term storage, so a sorted
//! `Vec` behind one mutex beats a heap that would lose the FIFO tie-break.
//!
//! The lock is never held across an await: [`PriorityQueue::drain`] and
//! [`PriorityQueue::for_each`] re-acquire it per operation, which is what
//! allows a running handler to enqueue more work into the same queue.

use std::future::Future;
use std::sync::{Mutex, PoisonError};

struct Entry<T> {
    priority: i32,
    element: T,
}

/// Priority-ordered buffer of `(priority, element)` pairs.
///
/// All accesses are serialized by a single internal mutex, so one instance
/// can be shared freely between producers and a draining consumer.
pub struct PriorityQueue<T> {
    entries: Mutex<Vec<Entry<T>>>,
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }
}

impl<T> PriorityQueue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Entry<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds an element with priority 0.
    pub fn add(&self, element: T) {
        self.add_priority(0, element);
    }

    /// Adds an element with a specific priority.
    ///
    /// Elements with a higher priority value will run *after* those with a
    /// lower value. Among equal priorities, new elements are appended after
    /// all existing elements of that priority.
    pub fn add_priority(&self, priority: i32, element: T) {
        let mut entries = self.lock();
        let at = entries
            .iter()
            .position(|e| e.priority > priority)
            .unwrap_or(entries.len());
        entries.insert(at, Entry { priority, element });
    }

    /// Removes and returns the head element, or `None` when empty.
    pub fn pop(&self) -> Option<T> {
        let mut entries = self.lock();
        if entries.is_empty() {
            None
        } else {
            Some(entries.remove(0).element)
        }
    }

    /// True when the queue currently holds no entries.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of entries currently queued.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Calls `handler` for each element of an internal snapshot, stopping
    /// at the first error.
    ///
    /// The snapshot is taken under the lock; the handler runs outside it,
    /// so the live queue may be mutated concurrently without affecting the
    /// handler's view.
    pub async fn for_each<F, Fut, E>(&self, mut handler: F) -> Result<(), E>
    where
        T: Clone,
        F: FnMut(T) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let snapshot: Vec<T> = self.lock().iter().map(|e| e.element.clone()).collect();
        for element in snapshot {
            handler(element).await?;
        }
        Ok(())
    }

    /// Repeatedly pops the head and calls `handler` until the queue is
    /// empty or the handler returns an error.
    ///
    /// The live queue is re-checked after every invocation, so a handler
    /// that enqueues new elements causes those to be processed in the same
    /// call. `drain` terminates only when the queue is truly empty or on
    /// the first error.
    pub async fn drain<F, Fut, E>(&self, mut handler: F) -> Result<(), E>
    where
        F: FnMut(T) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        while let Some(element) = self.pop() {
            handler(element).await?;
        }
        Ok(())
    }
}
