//! Unhandled rejection tracking.
//!
//! A promise that rejects with nobody listening gets one scheduling turn of
//! grace: the check runs once the turn's microtasks have drained and before
//! the next task, so handlers attached synchronously or from a microtask of
//! the same turn keep it quiet. A promise reported
//! unhandled that gets a handler later is reported again as handled.

use crate::config::RuntimeConfig;
use crate::promise::{Promise, PromiseId, PromiseState, WeakPromise};
use crate::task_queue::Task;
use core_types::Value;
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Where a promise stands in unhandled-rejection tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RejectionState {
    /// Not rejected, or rejected while already handled
    Unobserved,
    /// Rejected without a handler; the check is queued
    PendingCheck,
    /// A handler showed up before the check ran
    HandledImmediately,
    /// The check found no handler and the rejection was reported
    ReportedUnhandled,
    /// A handler showed up after the unhandled report
    ReportedHandled,
}

/// Handle returned when registering a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Counters kept by a [`RejectionTracker`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrackerStats {
    /// Rejections that started a check
    pub rejections_observed: u64,
    /// Checks that found a handler
    pub handled_immediately: u64,
    /// Unhandled events emitted
    pub reported_unhandled: u64,
    /// Handled events emitted
    pub reported_handled: u64,
}

type UnhandledListener = Rc<dyn Fn(&Value, &Promise)>;
type HandledListener = Rc<dyn Fn(&Promise)>;

#[derive(Clone)]
enum Listener {
    Unhandled(UnhandledListener),
    Handled(HandledListener),
}

/// Watches rejected promises of one realm and emits unhandled/handled events.
pub struct RejectionTracker {
    enabled: bool,
    warn_on_unhandled: bool,
    listeners: RefCell<Vec<(ListenerId, Listener)>>,
    next_listener_id: Cell<u64>,
    outstanding: RefCell<BTreeMap<PromiseId, WeakPromise>>,
    stats: RefCell<TrackerStats>,
}

impl RejectionTracker {
    pub(crate) fn new(config: &RuntimeConfig) -> Self {
        Self {
            enabled: config.track_rejections,
            warn_on_unhandled: config.warn_on_unhandled,
            listeners: RefCell::new(Vec::new()),
            next_listener_id: Cell::new(1),
            outstanding: RefCell::new(BTreeMap::new()),
            stats: RefCell::new(TrackerStats::default()),
        }
    }

    /// Returns true if rejections are tracked at all.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Registers a listener for the unhandled event. It receives the reason
    /// and the promise.
    pub fn on_unhandled_rejection<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&Value, &Promise) + 'static,
    {
        self.add_listener(Listener::Unhandled(Rc::new(listener)))
    }

    /// Registers a listener for the handled event.
    pub fn on_rejection_handled<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&Promise) + 'static,
    {
        self.add_listener(Listener::Handled(Rc::new(listener)))
    }

    /// Unregisters a listener. Returns false if it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(registered, _)| *registered != id);
        listeners.len() != before
    }

    /// Number of registered listeners of both kinds.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Promises reported unhandled that are still alive and have not been
    /// handled since, oldest first.
    pub fn outstanding(&self) -> Vec<Promise> {
        let mut outstanding = self.outstanding.borrow_mut();
        outstanding.retain(|_, weak| weak.upgrade().is_some());
        outstanding.values().filter_map(WeakPromise::upgrade).collect()
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> TrackerStats {
        self.stats.borrow().clone()
    }

    fn add_listener(&self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_listener_id.get());
        self.next_listener_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    fn snapshot(&self) -> Vec<Listener> {
        self.listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect()
    }

    /// Called when `promise` rejects without a handler.
    pub(crate) fn promise_rejected(&self, promise: &Promise) {
        if !self.enabled {
            return;
        }
        promise.set_rejection_state(RejectionState::PendingCheck);
        self.stats.borrow_mut().rejections_observed += 1;
        tracing::trace!(promise = %promise.id(), "rejection check scheduled");

        let target = promise.clone();
        promise.realm().enqueue_rejection_check(Task::new(move || {
            target.realm().rejection_tracker().check(&target);
            Ok(())
        }));
    }

    /// Called when `promise` gets its first handler.
    pub(crate) fn handler_attached(&self, promise: &Promise) {
        if promise.rejection_state() != RejectionState::ReportedUnhandled {
            return;
        }
        promise.set_rejection_state(RejectionState::ReportedHandled);
        self.outstanding.borrow_mut().remove(&promise.id());

        let target = promise.clone();
        promise.realm().enqueue_task(Task::new(move || {
            target.realm().rejection_tracker().emit_handled(&target);
            Ok(())
        }));
    }

    fn check(&self, promise: &Promise) {
        if promise.rejection_state() != RejectionState::PendingCheck {
            return;
        }
        if promise.is_handled() {
            promise.set_rejection_state(RejectionState::HandledImmediately);
            self.stats.borrow_mut().handled_immediately += 1;
            tracing::trace!(promise = %promise.id(), "rejection handled within its turn");
            return;
        }

        let PromiseState::Rejected(reason) = promise.state() else {
            return;
        };
        promise.set_rejection_state(RejectionState::ReportedUnhandled);
        self.outstanding
            .borrow_mut()
            .insert(promise.id(), promise.downgrade());
        self.stats.borrow_mut().reported_unhandled += 1;

        let listeners: Vec<UnhandledListener> = self
            .snapshot()
            .into_iter()
            .filter_map(|listener| match listener {
                Listener::Unhandled(f) => Some(f),
                Listener::Handled(_) => None,
            })
            .collect();
        if listeners.is_empty() {
            if self.warn_on_unhandled {
                tracing::warn!(promise = %promise.id(), reason = %reason, "unhandled promise rejection");
            }
            return;
        }
        tracing::debug!(promise = %promise.id(), listeners = listeners.len(), "reporting unhandled rejection");
        for listener in listeners {
            listener(&reason, promise);
        }
    }

    fn emit_handled(&self, promise: &Promise) {
        self.stats.borrow_mut().reported_handled += 1;
        tracing::debug!(promise = %promise.id(), "rejection handled late");
        for listener in self.snapshot() {
            if let Listener::Handled(f) = listener {
                f(promise);
            }
        }
    }
}

impl fmt::Debug for RejectionTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RejectionTracker")
            .field("enabled", &self.enabled)
            .field("listeners", &self.listener_count())
            .field("outstanding", &self.outstanding.borrow().len())
            .field("stats", &*self.stats.borrow())
            .finish()
    }
}
