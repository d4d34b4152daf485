//! Unit tests for EventLoop

use core_types::JsError;
use promise_runtime::{EventLoop, MicroTask, Scheduler, Task};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

type Log = Rc<RefCell<Vec<i32>>>;

fn task(log: &Log, entry: i32) -> Task {
    let log = log.clone();
    Task::new(move || {
        log.borrow_mut().push(entry);
        Ok(())
    })
}

fn microtask(log: &Log, entry: i32) -> MicroTask {
    let log = log.clone();
    MicroTask::new(move || {
        log.borrow_mut().push(entry);
        Ok(())
    })
}

#[test]
fn new_event_loop_has_empty_queues() {
    let event_loop = EventLoop::new();
    assert!(event_loop.is_task_queue_empty());
    assert!(event_loop.is_microtask_queue_empty());
    assert_eq!(event_loop.pending_timers(), 0);
}

#[test]
fn enqueue_task_adds_to_task_queue() {
    let event_loop = EventLoop::new();
    event_loop.enqueue_task(Task::new(|| Ok(())));
    assert!(!event_loop.is_task_queue_empty());
}

#[test]
fn enqueue_microtask_adds_to_microtask_queue() {
    let event_loop = EventLoop::new();
    event_loop.enqueue_microtask(MicroTask::new(|| Ok(())));
    assert!(!event_loop.is_microtask_queue_empty());
}

#[test]
fn task_queue_fifo_order() {
    let event_loop = EventLoop::new();
    let log = Log::default();
    event_loop.enqueue_task(task(&log, 1));
    event_loop.enqueue_task(task(&log, 2));

    event_loop.run_until_done().unwrap();
    assert_eq!(*log.borrow(), vec![1, 2]);
}

#[test]
fn microtask_queue_fifo_order() {
    let event_loop = EventLoop::new();
    let log = Log::default();
    event_loop.enqueue_microtask(microtask(&log, 1));
    event_loop.enqueue_microtask(microtask(&log, 2));

    event_loop.run_all_microtasks().unwrap();
    assert_eq!(*log.borrow(), vec![1, 2]);
}

#[test]
fn microtasks_drain_between_tasks() {
    let event_loop = Rc::new(EventLoop::new());
    let log = Log::default();

    let (l, lg) = (event_loop.clone(), log.clone());
    event_loop.enqueue_task(Task::new(move || {
        lg.borrow_mut().push(1);
        l.enqueue_microtask(microtask(&lg, 2));
        Ok(())
    }));
    event_loop.enqueue_task(task(&log, 3));

    event_loop.run_until_done().unwrap();
    assert_eq!(*log.borrow(), vec![1, 2, 3]);
}

#[test]
fn process_one_cycle_runs_a_single_task() {
    let event_loop = EventLoop::new();
    let log = Log::default();
    event_loop.enqueue_task(task(&log, 1));
    event_loop.enqueue_task(task(&log, 2));

    event_loop.process_one_cycle().unwrap();
    assert_eq!(*log.borrow(), vec![1]);
    assert!(!event_loop.is_task_queue_empty());
}

#[test]
fn scheduler_trait_routes_to_queues() {
    let event_loop = EventLoop::new();
    let scheduler: &dyn Scheduler = &event_loop;
    scheduler.enqueue_task(Task::new(|| Ok(())));
    scheduler.enqueue_microtask(MicroTask::new(|| Ok(())));
    scheduler.enqueue_rejection_check(Task::new(|| Ok(())));
    assert!(!event_loop.is_task_queue_empty());
    assert!(!event_loop.is_microtask_queue_empty());
    assert!(!event_loop.is_rejection_check_queue_empty());
}

#[test]
fn rejection_checks_end_the_turn_that_queued_them() {
    let event_loop = Rc::new(EventLoop::new());
    let log = Log::default();
    event_loop.enqueue_task(task(&log, 2));

    let (l, lg) = (event_loop.clone(), log.clone());
    event_loop.enqueue_task(Task::new(move || {
        l.enqueue_rejection_check(task(&lg, 4));
        l.enqueue_microtask(microtask(&lg, 3));
        Ok(())
    }));
    event_loop.enqueue_task(task(&log, 5));
    event_loop.enqueue_rejection_check(task(&log, 1));

    event_loop.run_until_done().unwrap();
    assert_eq!(*log.borrow(), vec![1, 2, 3, 4, 5]);
}

#[test]
fn run_until_idle_runs_lone_rejection_checks() {
    let event_loop = EventLoop::new();
    let log = Log::default();
    event_loop.enqueue_rejection_check(task(&log, 1));

    event_loop.run_until_idle().unwrap();
    assert_eq!(*log.borrow(), vec![1]);
    assert!(event_loop.is_rejection_check_queue_empty());
}

#[test]
fn timers_with_equal_deadlines_fire_in_schedule_order() {
    let event_loop = EventLoop::new();
    let log = Log::default();
    event_loop.set_timeout(Duration::from_millis(10), task(&log, 1));
    event_loop.set_timeout(Duration::from_millis(10), task(&log, 2));
    event_loop.set_timeout(Duration::from_millis(5), task(&log, 0));

    event_loop.run_until_done().unwrap();
    assert_eq!(*log.borrow(), vec![0, 1, 2]);
    assert_eq!(event_loop.now(), Duration::from_millis(10));
}

#[test]
fn run_until_idle_leaves_timers_alone() {
    let event_loop = EventLoop::new();
    let log = Log::default();
    event_loop.set_timeout(Duration::from_millis(1), task(&log, 1));

    event_loop.run_until_idle().unwrap();
    assert!(log.borrow().is_empty());
    assert_eq!(event_loop.pending_timers(), 1);
}

#[test]
fn microtask_error_is_returned() {
    let event_loop = EventLoop::new();
    event_loop.enqueue_microtask(MicroTask::new(|| Err(JsError::internal("broken"))));
    assert_eq!(
        event_loop.run_until_done().unwrap_err(),
        JsError::internal("broken")
    );
}
