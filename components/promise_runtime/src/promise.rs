//! Promise implementation following the Promises/A+ specification.
//!
//! A [`Promise`] is a shared handle to a single-assignment cell. It starts
//! pending and is settled exactly once through [`Promise::settle`], the only
//! place that changes its state. Reactions registered with [`Promise::then`]
//! always run from a microtask on the promise's realm, never inline.

use crate::realm::Realm;
use crate::rejection_tracker::RejectionState;
use crate::resolution::resolve_promise;
use crate::task_queue::MicroTask;
use core_types::{Function, Thenable, Value};
use serde::Serialize;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// The state of a Promise.
///
/// Once settled (Fulfilled or Rejected), a Promise cannot change state and
/// its value never changes.
#[derive(Debug, Clone, PartialEq)]
pub enum PromiseState {
    /// The initial state; the promise is neither fulfilled nor rejected.
    Pending,
    /// The promise has been fulfilled with a value.
    Fulfilled(Value),
    /// The promise has been rejected with a reason.
    Rejected(Value),
}

impl PromiseState {
    fn label(&self) -> &'static str {
        match self {
            PromiseState::Pending => "pending",
            PromiseState::Fulfilled(_) => "fulfilled",
            PromiseState::Rejected(_) => "rejected",
        }
    }
}

/// Terminal outcome handed to [`Promise::settle`] and to reaction jobs.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Settlement {
    Fulfilled(Value),
    Rejected(Value),
}

impl From<Settlement> for PromiseState {
    fn from(outcome: Settlement) -> Self {
        match outcome {
            Settlement::Fulfilled(value) => PromiseState::Fulfilled(value),
            Settlement::Rejected(reason) => PromiseState::Rejected(reason),
        }
    }
}

/// Identity of a promise within its realm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PromiseId(pub(crate) u64);

impl PromiseId {
    /// The raw counter value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PromiseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A reaction to be triggered when a Promise settles.
///
/// This represents the handlers registered via `.then()` together with the
/// derived promise their outcome settles.
#[derive(Debug)]
pub struct PromiseReaction {
    /// The promise that will be resolved/rejected based on this reaction
    pub derived: Promise,
    /// Handler for fulfilled state
    pub on_fulfilled: Option<Function>,
    /// Handler for rejected state
    pub on_rejected: Option<Function>,
}

impl PromiseReaction {
    /// Runs the matching handler and settles the derived promise.
    ///
    /// A missing fulfillment handler passes the value through; a missing
    /// rejection handler re-throws the reason.
    fn run(self, outcome: Settlement) {
        let (handler, argument, rejected) = match outcome {
            Settlement::Fulfilled(value) => (self.on_fulfilled, value, false),
            Settlement::Rejected(reason) => (self.on_rejected, reason, true),
        };
        match handler {
            Some(handler) => match handler.call(vec![argument]) {
                Ok(value) => resolve_promise(&self.derived, value),
                Err(thrown) => self.derived.settle(Settlement::Rejected(thrown)),
            },
            None if rejected => self.derived.settle(Settlement::Rejected(argument)),
            None => resolve_promise(&self.derived, argument),
        }
    }
}

struct PromiseSlot {
    state: PromiseState,
    reactions: Vec<PromiseReaction>,
}

pub(crate) struct PromiseInner {
    id: PromiseId,
    realm: Realm,
    slot: RefCell<PromiseSlot>,
    handled: Cell<bool>,
    rejection_state: Cell<RejectionState>,
}

impl Thenable for PromiseInner {
    fn then_member(self: Rc<Self>) -> Result<Value, Value> {
        let promise = Promise { inner: self };
        Ok(Value::Function(Function::new(move |args| {
            let mut args = args.into_iter();
            let on_fulfilled = args.next().and_then(into_callable);
            let on_rejected = args.next().and_then(into_callable);
            Ok(promise.then(on_fulfilled, on_rejected).to_value())
        })))
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }

    fn class_name(&self) -> &'static str {
        "Promise"
    }
}

fn into_callable(value: Value) -> Option<Function> {
    match value {
        Value::Function(func) => Some(func),
        _ => None,
    }
}

/// A JavaScript Promise.
///
/// Promises represent the eventual completion (or failure) of an asynchronous
/// operation and its resulting value. Cloning a `Promise` clones the handle,
/// not the promise.
///
/// # Examples
///
/// ```
/// use core_types::{Function, Value};
/// use promise_runtime::{Promise, PromiseState, Runtime};
///
/// let runtime = Runtime::new();
/// let promise = Promise::new(runtime.realm(), |resolvers| {
///     resolvers.resolve(Value::Smi(20));
///     Ok(())
/// });
///
/// let doubled = promise.then(
///     Some(Function::unary(|v| match v {
///         Value::Smi(n) => Ok(Value::Smi(n * 2 + 2)),
///         other => Err(other),
///     })),
///     None,
/// );
///
/// assert_eq!(doubled.state(), PromiseState::Pending);
/// runtime.run_until_done().unwrap();
/// assert_eq!(doubled.state(), PromiseState::Fulfilled(Value::Smi(42)));
/// ```
#[derive(Clone)]
pub struct Promise {
    inner: Rc<PromiseInner>,
}

/// One-shot `resolve`/`reject` capability pair handed to an executor.
///
/// Only the first call of either capability has any effect.
#[derive(Clone)]
pub struct Resolvers {
    promise: Promise,
    already_resolved: Rc<Cell<bool>>,
}

impl Resolvers {
    fn new(promise: &Promise) -> Self {
        Self {
            promise: promise.clone(),
            already_resolved: Rc::new(Cell::new(false)),
        }
    }

    /// Resolves the promise, adopting `value` if it is a thenable.
    pub fn resolve(&self, value: Value) {
        if self.already_resolved.replace(true) {
            return;
        }
        resolve_promise(&self.promise, value);
    }

    /// Rejects the promise with `reason`.
    pub fn reject(&self, reason: Value) {
        if self.already_resolved.replace(true) {
            return;
        }
        self.promise.settle(Settlement::Rejected(reason));
    }

    /// `resolve` as a callable value.
    pub fn resolve_function(&self) -> Function {
        let resolvers = self.clone();
        Function::unary(move |value| {
            resolvers.resolve(value);
            Ok(Value::Undefined)
        })
    }

    /// `reject` as a callable value.
    pub fn reject_function(&self) -> Function {
        let resolvers = self.clone();
        Function::unary(move |reason| {
            resolvers.reject(reason);
            Ok(Value::Undefined)
        })
    }
}

impl fmt::Debug for Resolvers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolvers")
            .field("promise", &self.promise.id())
            .field("already_resolved", &self.already_resolved.get())
            .finish()
    }
}

/// A pending promise together with its capabilities, as a standalone object.
#[derive(Debug, Clone)]
pub struct Deferred {
    /// The promise controlled by `resolve` and `reject`
    pub promise: Promise,
    /// Resolves `promise` (first capability call wins)
    pub resolve: Function,
    /// Rejects `promise` (first capability call wins)
    pub reject: Function,
}

impl Promise {
    pub(crate) fn pending(realm: &Realm) -> Self {
        let inner = PromiseInner {
            id: realm.next_promise_id(),
            realm: realm.clone(),
            slot: RefCell::new(PromiseSlot {
                state: PromiseState::Pending,
                reactions: Vec::new(),
            }),
            handled: Cell::new(false),
            rejection_state: Cell::new(RejectionState::Unobserved),
        };
        Self {
            inner: Rc::new(inner),
        }
    }

    /// Creates a promise and runs `executor` synchronously with its
    /// capabilities.
    ///
    /// An `Err` returned by the executor rejects the promise, unless a
    /// capability was already called.
    pub fn new<F>(realm: &Realm, executor: F) -> Self
    where
        F: FnOnce(Resolvers) -> Result<(), Value>,
    {
        let promise = Self::pending(realm);
        let resolvers = Resolvers::new(&promise);
        if let Err(thrown) = executor(resolvers.clone()) {
            tracing::trace!(promise = %promise.id(), "executor threw");
            resolvers.reject(thrown);
        }
        promise
    }

    /// Creates a pending promise and hands out its capabilities.
    pub fn deferred(realm: &Realm) -> Deferred {
        let promise = Self::pending(realm);
        let resolvers = Resolvers::new(&promise);
        Deferred {
            resolve: resolvers.resolve_function(),
            reject: resolvers.reject_function(),
            promise,
        }
    }

    /// Returns `value` itself if it is already a promise, otherwise a new
    /// promise resolved with it.
    pub fn resolve(realm: &Realm, value: Value) -> Self {
        if let Some(promise) = Self::from_value(&value) {
            return promise;
        }
        let promise = Self::pending(realm);
        resolve_promise(&promise, value);
        promise
    }

    /// Returns a new promise rejected with `reason`. The reason is never
    /// unwrapped, even if it is itself a promise.
    pub fn reject(realm: &Realm, reason: Value) -> Self {
        let promise = Self::pending(realm);
        promise.settle(Settlement::Rejected(reason));
        promise
    }

    /// Adds handlers for fulfillment and/or rejection.
    ///
    /// Returns a new Promise that will be resolved based on the handlers'
    /// results. Handlers run from a microtask even if this promise is
    /// already settled.
    ///
    /// # Arguments
    ///
    /// * `on_fulfilled` - Optional handler called when Promise fulfills
    /// * `on_rejected` - Optional handler called when Promise rejects
    pub fn then(&self, on_fulfilled: Option<Function>, on_rejected: Option<Function>) -> Promise {
        let derived = Self::pending(self.realm());
        // Every reaction forwards rejections to its derived promise, so the
        // rejection is now somebody else's to report.
        if !self.inner.handled.replace(true) {
            self.realm().rejection_tracker().handler_attached(self);
        }

        let reaction = PromiseReaction {
            derived: derived.clone(),
            on_fulfilled,
            on_rejected,
        };
        let settled = {
            let mut guard = self.inner.slot.borrow_mut();
            let slot = &mut *guard;
            match &slot.state {
                PromiseState::Pending => {
                    slot.reactions.push(reaction);
                    None
                }
                PromiseState::Fulfilled(value) => {
                    Some((reaction, Settlement::Fulfilled(value.clone())))
                }
                PromiseState::Rejected(reason) => {
                    Some((reaction, Settlement::Rejected(reason.clone())))
                }
            }
        };
        if let Some((reaction, outcome)) = settled {
            self.schedule_reaction(reaction, outcome);
        }
        derived
    }

    /// Sugar for `then(None, Some(on_rejected))`.
    pub fn catch(&self, on_rejected: Function) -> Promise {
        self.then(None, Some(on_rejected))
    }

    /// The single state transition: `Pending` to `Fulfilled` or `Rejected`.
    ///
    /// If the Promise is already settled, this is a no-op.
    pub(crate) fn settle(&self, outcome: Settlement) {
        let reactions = {
            let mut slot = self.inner.slot.borrow_mut();
            if !matches!(slot.state, PromiseState::Pending) {
                return;
            }
            slot.state = outcome.clone().into();
            std::mem::take(&mut slot.reactions)
        };
        tracing::trace!(
            promise = %self.id(),
            reactions = reactions.len(),
            "promise {}",
            if matches!(outcome, Settlement::Fulfilled(_)) { "fulfilled" } else { "rejected" }
        );

        for reaction in reactions {
            self.schedule_reaction(reaction, outcome.clone());
        }
        if matches!(outcome, Settlement::Rejected(_)) && !self.is_handled() {
            self.realm().rejection_tracker().promise_rejected(self);
        }
    }

    fn schedule_reaction(&self, reaction: PromiseReaction, outcome: Settlement) {
        let source = self.id();
        self.realm().enqueue_microtask(MicroTask::new(move || {
            tracing::trace!(promise = %source, derived = %reaction.derived.id(), "running reaction");
            reaction.run(outcome);
            Ok(())
        }));
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> PromiseState {
        self.inner.slot.borrow().state.clone()
    }

    /// Returns true while the promise has not settled.
    pub fn is_pending(&self) -> bool {
        matches!(self.inner.slot.borrow().state, PromiseState::Pending)
    }

    /// Identity of this promise within its realm.
    pub fn id(&self) -> PromiseId {
        self.inner.id
    }

    /// The realm this promise belongs to.
    pub fn realm(&self) -> &Realm {
        &self.inner.realm
    }

    /// Returns true once any reaction has been attached.
    pub fn is_handled(&self) -> bool {
        self.inner.handled.get()
    }

    /// Where this promise stands in unhandled-rejection tracking.
    pub fn rejection_state(&self) -> RejectionState {
        self.inner.rejection_state.get()
    }

    pub(crate) fn set_rejection_state(&self, state: RejectionState) {
        self.inner.rejection_state.set(state);
    }

    /// Number of reactions waiting for settlement.
    pub fn reaction_count(&self) -> usize {
        self.inner.slot.borrow().reactions.len()
    }

    /// Wraps this promise into a [`Value`].
    pub fn to_value(&self) -> Value {
        Value::Object(self.inner.clone())
    }

    /// Recovers the promise from a [`Value`] produced by [`Promise::to_value`].
    pub fn from_value(value: &Value) -> Option<Promise> {
        match value {
            Value::Object(object) => Rc::clone(object)
                .into_any()
                .downcast::<PromiseInner>()
                .ok()
                .map(|inner| Promise { inner }),
            _ => None,
        }
    }

    /// Returns true if both handles refer to the same promise.
    pub fn ptr_eq(&self, other: &Promise) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn downgrade(&self) -> WeakPromise {
        WeakPromise(Rc::downgrade(&self.inner))
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Promise");
        out.field("id", &self.id());
        match self.inner.slot.try_borrow() {
            Ok(slot) => out.field("state", &slot.state.label()),
            Err(_) => out.field("state", &"<borrowed>"),
        };
        out.finish()
    }
}

impl PartialEq for Promise {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl From<Promise> for Value {
    fn from(promise: Promise) -> Self {
        promise.to_value()
    }
}

/// Non-owning promise handle kept by the rejection tracker.
#[derive(Debug, Clone)]
pub(crate) struct WeakPromise(Weak<PromiseInner>);

impl WeakPromise {
    pub(crate) fn upgrade(&self) -> Option<Promise> {
        self.0.upgrade().map(|inner| Promise { inner })
    }
}

impl fmt::Debug for PromiseInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromiseInner").field("id", &self.id).finish()
    }
}
