//! The realm: everything promises created together share.

use crate::config::RuntimeConfig;
use crate::promise::PromiseId;
use crate::rejection_tracker::RejectionTracker;
use crate::scheduler::Scheduler;
use crate::task_queue::{MicroTask, Task};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

struct RealmInner {
    scheduler: Rc<dyn Scheduler>,
    tracker: RejectionTracker,
    config: RuntimeConfig,
    next_promise_id: Cell<u64>,
}

/// Shared context of a group of promises: the scheduler their jobs go to,
/// the rejection tracker watching them and the configuration they honor.
///
/// Cloning a `Realm` clones the handle.
#[derive(Clone)]
pub struct Realm {
    inner: Rc<RealmInner>,
}

impl Realm {
    /// Creates a realm scheduling onto `scheduler`.
    pub fn new(scheduler: Rc<dyn Scheduler>, config: RuntimeConfig) -> Self {
        let tracker = RejectionTracker::new(&config);
        Self {
            inner: Rc::new(RealmInner {
                scheduler,
                tracker,
                config,
                next_promise_id: Cell::new(1),
            }),
        }
    }

    /// The rejection tracker of this realm.
    pub fn rejection_tracker(&self) -> &RejectionTracker {
        &self.inner.tracker
    }

    /// The configuration this realm was created with.
    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    /// Returns true if both handles refer to the same realm.
    pub fn ptr_eq(&self, other: &Realm) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn enqueue_microtask(&self, microtask: MicroTask) {
        self.inner.scheduler.enqueue_microtask(microtask);
    }

    pub(crate) fn enqueue_task(&self, task: Task) {
        self.inner.scheduler.enqueue_task(task);
    }

    pub(crate) fn enqueue_rejection_check(&self, check: Task) {
        self.inner.scheduler.enqueue_rejection_check(check);
    }

    pub(crate) fn next_promise_id(&self) -> PromiseId {
        let id = self.inner.next_promise_id.get();
        self.inner.next_promise_id.set(id + 1);
        PromiseId(id)
    }
}

impl fmt::Debug for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Realm")
            .field("config", &self.inner.config)
            .field("next_promise_id", &self.inner.next_promise_id.get())
            .finish_non_exhaustive()
    }
}
