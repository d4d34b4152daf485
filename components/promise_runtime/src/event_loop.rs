//! Event loop implementation.
//!
//! This module provides the event loop that coordinates task, microtask and
//! timer execution following the JavaScript event loop model. Time is
//! virtual: the clock only moves when the loop runs out of runnable work and
//! jumps to the next timer deadline, which keeps runs deterministic.

use crate::scheduler::Scheduler;
use crate::task_queue::{MicroTask, MicrotaskQueue, Task, TaskQueue, TimerId, TimerQueue};
use core_types::JsError;
use std::cell::{Cell, RefCell};
use std::time::Duration;

/// The JavaScript event loop.
///
/// Each iteration (turn) of the loop:
/// 1. Takes the oldest task from the task queue and executes it
/// 2. Drains all microtasks in the microtask queue
/// 3. Runs the rejection checks queued so far, draining microtasks after each
/// 4. Repeats
///
/// When no task is runnable, the clock advances to the earliest timer and the
/// timers due at that instant become tasks.
///
/// All methods take `&self` so that running jobs can enqueue more work on the
/// same loop.
///
/// # Examples
///
/// ```
/// use promise_runtime::{EventLoop, Task, MicroTask};
/// use std::time::Duration;
///
/// let event_loop = EventLoop::new();
///
/// event_loop.enqueue_task(Task::new(|| Ok(())));
/// event_loop.enqueue_microtask(MicroTask::new(|| Ok(())));
/// event_loop.set_timeout(Duration::from_millis(10), Task::new(|| Ok(())));
/// event_loop.run_until_done().unwrap();
///
/// assert_eq!(event_loop.now(), Duration::from_millis(10));
/// ```
#[derive(Debug, Default)]
pub struct EventLoop {
    task_queue: RefCell<TaskQueue>,
    microtask_queue: RefCell<MicrotaskQueue>,
    rejection_checks: RefCell<TaskQueue>,
    timers: RefCell<TimerQueue>,
    now: Cell<Duration>,
    microtask_limit: usize,
}

impl EventLoop {
    /// Creates a new EventLoop with empty queues and no microtask limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an EventLoop that fails a microtask drain after `limit`
    /// microtasks (`0` = unlimited).
    pub fn with_microtask_limit(limit: usize) -> Self {
        Self {
            microtask_limit: limit,
            ..Self::default()
        }
    }

    /// Adds a task to the task queue.
    pub fn enqueue_task(&self, task: Task) {
        self.task_queue.borrow_mut().enqueue(task);
    }

    /// Adds a microtask to the microtask queue.
    pub fn enqueue_microtask(&self, microtask: MicroTask) {
        self.microtask_queue.borrow_mut().enqueue(microtask);
    }

    /// Adds a check to run at the end of the current turn.
    pub fn enqueue_rejection_check(&self, check: Task) {
        self.rejection_checks.borrow_mut().enqueue(check);
    }

    /// Schedules `task` to run once `delay` has elapsed on the loop's clock.
    pub fn set_timeout(&self, delay: Duration, task: Task) -> TimerId {
        let deadline = self.now.get() + delay;
        self.timers.borrow_mut().schedule(deadline, task)
    }

    /// Cancels a pending timer.
    pub fn clear_timeout(&self, id: TimerId) -> bool {
        self.timers.borrow_mut().cancel(id)
    }

    /// Current time on the loop's virtual clock.
    pub fn now(&self) -> Duration {
        self.now.get()
    }

    /// Returns true if the task queue is empty.
    pub fn is_task_queue_empty(&self) -> bool {
        self.task_queue.borrow().is_empty()
    }

    /// Returns true if the microtask queue is empty.
    pub fn is_microtask_queue_empty(&self) -> bool {
        self.microtask_queue.borrow().is_empty()
    }

    /// Returns true if no rejection check is waiting.
    pub fn is_rejection_check_queue_empty(&self) -> bool {
        self.rejection_checks.borrow().is_empty()
    }

    /// Number of timers that have not fired yet.
    pub fn pending_timers(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Runs all microtasks in the queue until empty.
    ///
    /// New microtasks added during execution are also processed before this
    /// method returns.
    pub fn run_all_microtasks(&self) -> Result<(), JsError> {
        let mut executed = 0usize;
        loop {
            let next = self.microtask_queue.borrow_mut().dequeue();
            let Some(microtask) = next else {
                return Ok(());
            };
            executed += 1;
            if self.microtask_limit > 0 && executed > self.microtask_limit {
                return Err(JsError::internal(format!(
                    "microtask limit of {} exceeded",
                    self.microtask_limit
                )));
            }
            microtask.run()?;
        }
    }

    /// Ends a turn: drains microtasks, then runs the queued rejection
    /// checks. Microtasks queued by a check drain before the next check.
    pub fn run_end_of_turn(&self) -> Result<(), JsError> {
        loop {
            self.run_all_microtasks()?;
            let next = self.rejection_checks.borrow_mut().dequeue();
            match next {
                Some(check) => check.run()?,
                None => return Ok(()),
            }
        }
    }

    /// Processes one complete cycle: one task, then the end of its turn.
    ///
    /// Work queued by code running outside the loop belongs to that code's
    /// turn and is finished before the task.
    pub fn process_one_cycle(&self) -> Result<(), JsError> {
        self.run_end_of_turn()?;
        let next = self.task_queue.borrow_mut().dequeue();
        if let Some(task) = next {
            task.run()?;
        }
        self.run_end_of_turn()
    }

    /// Runs turns until no task, microtask or rejection check is left, without
    /// moving the clock.
    pub fn run_until_idle(&self) -> Result<(), JsError> {
        while !self.is_task_queue_empty()
            || !self.is_microtask_queue_empty()
            || !self.is_rejection_check_queue_empty()
        {
            self.process_one_cycle()?;
        }
        Ok(())
    }

    /// Runs the event loop until all tasks, microtasks and timers are processed.
    ///
    /// # Returns
    ///
    /// `Ok(())` if everything completed, or the first error a job returned.
    pub fn run_until_done(&self) -> Result<(), JsError> {
        loop {
            self.run_until_idle()?;
            let next = self.timers.borrow().next_deadline();
            let Some(deadline) = next else {
                return Ok(());
            };
            self.fire_timers_at(deadline);
        }
    }

    /// Runs everything that becomes due within `delay`, then leaves the clock
    /// at `now + delay`.
    pub fn advance_by(&self, delay: Duration) -> Result<(), JsError> {
        let target = self.now.get() + delay;
        loop {
            self.run_until_idle()?;
            let next = self.timers.borrow().next_deadline();
            match next {
                Some(deadline) if deadline <= target => self.fire_timers_at(deadline),
                _ => break,
            }
        }
        self.now.set(target.max(self.now.get()));
        Ok(())
    }

    fn fire_timers_at(&self, deadline: Duration) {
        if deadline > self.now.get() {
            self.now.set(deadline);
        }
        let now = self.now.get();
        let mut fired = 0usize;
        loop {
            let due = self.timers.borrow_mut().pop_due(now);
            let Some(task) = due else {
                break;
            };
            self.enqueue_task(task);
            fired += 1;
        }
        tracing::trace!(now_ms = now.as_millis() as u64, fired, "timers fired");
    }
}

impl Scheduler for EventLoop {
    fn enqueue_microtask(&self, microtask: MicroTask) {
        EventLoop::enqueue_microtask(self, microtask);
    }

    fn enqueue_task(&self, task: Task) {
        EventLoop::enqueue_task(self, task);
    }

    fn enqueue_rejection_check(&self, check: Task) {
        EventLoop::enqueue_rejection_check(self, check);
    }
}
