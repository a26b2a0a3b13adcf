//! Priority-ordered deferred-work queue.

mod priority;

pub use priority::PriorityQueue;
