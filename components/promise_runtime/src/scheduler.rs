//! Scheduler adapter.
//!
//! Promises never run callbacks inline; they hand work to a [`Scheduler`].
//! The host decides what a "later turn" means. [`crate::EventLoop`] is the
//! implementation shipped with this crate.

use crate::task_queue::{MicroTask, Task};

/// The deferral primitives the promise core consumes.
///
/// All queues must be FIFO. Every microtask enqueued before the next task
/// starts must run before that task.
pub trait Scheduler {
    /// Runs `microtask` on a later turn, after everything already queued.
    fn enqueue_microtask(&self, microtask: MicroTask);

    /// Runs `task` after the current batch of microtasks has drained.
    fn enqueue_task(&self, task: Task);

    /// Runs `check` at the end of the current turn: after the microtask
    /// queue has drained and before the next task starts, no matter how
    /// many tasks are already waiting.
    fn enqueue_rejection_check(&self, check: Task);
}
