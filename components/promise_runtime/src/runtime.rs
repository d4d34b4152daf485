//! A realm wired to its own event loop.

use crate::config::RuntimeConfig;
use crate::constructor::PromiseConstructor;
use crate::event_loop::EventLoop;
use crate::promise::Promise;
use crate::realm::Realm;
use crate::task_queue::{Task, TimerId};
use core_types::{JsError, Value};
use std::rc::Rc;
use std::time::Duration;

/// An [`EventLoop`] together with the [`Realm`] scheduling onto it.
///
/// # Examples
///
/// ```
/// use core_types::Value;
/// use promise_runtime::{Promise, PromiseState, Runtime};
/// use std::time::Duration;
///
/// let runtime = Runtime::new();
/// let slow = runtime.resolve_after(Duration::from_millis(50), Value::from("slow"));
/// let fast = runtime.resolve_after(Duration::from_millis(10), Value::from("fast"));
/// let winner = Promise::race(runtime.realm(), vec![slow.to_value(), fast.to_value()]);
///
/// runtime.run_until_done().unwrap();
/// assert_eq!(winner.state(), PromiseState::Fulfilled(Value::from("fast")));
/// ```
#[derive(Debug)]
pub struct Runtime {
    event_loop: Rc<EventLoop>,
    realm: Realm,
}

impl Runtime {
    /// Creates a runtime with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Creates a runtime with `config`.
    pub fn with_config(config: RuntimeConfig) -> Self {
        let event_loop = Rc::new(EventLoop::with_microtask_limit(config.microtask_limit));
        let realm = Realm::new(event_loop.clone(), config);
        tracing::debug!(config = ?realm.config(), "runtime created");
        Self { event_loop, realm }
    }

    /// The realm promises of this runtime live in.
    pub fn realm(&self) -> &Realm {
        &self.realm
    }

    /// The loop driving this runtime.
    pub fn event_loop(&self) -> &EventLoop {
        &self.event_loop
    }

    /// The `Promise` global of this runtime's realm.
    pub fn constructor(&self) -> PromiseConstructor {
        PromiseConstructor::new(&self.realm)
    }

    /// Runs until no task, microtask or timer is left.
    pub fn run_until_done(&self) -> Result<(), JsError> {
        self.event_loop.run_until_done()
    }

    /// Runs queued work without moving the clock.
    pub fn run_until_idle(&self) -> Result<(), JsError> {
        self.event_loop.run_until_idle()
    }

    /// Runs everything due within `delay` and moves the clock by `delay`.
    pub fn advance_by(&self, delay: Duration) -> Result<(), JsError> {
        self.event_loop.advance_by(delay)
    }

    /// Runs `callback` as a task once `delay` has elapsed.
    pub fn set_timeout<F>(&self, delay: Duration, callback: F) -> TimerId
    where
        F: FnOnce() -> Result<(), JsError> + 'static,
    {
        self.event_loop.set_timeout(delay, Task::new(callback))
    }

    /// A promise fulfilled with `value` after `delay`.
    pub fn resolve_after(&self, delay: Duration, value: Value) -> Promise {
        Promise::new(&self.realm, |resolvers| {
            self.set_timeout(delay, move || {
                resolvers.resolve(value);
                Ok(())
            });
            Ok(())
        })
    }

    /// A promise rejected with `reason` after `delay`.
    pub fn reject_after(&self, delay: Duration, reason: Value) -> Promise {
        Promise::new(&self.realm, |resolvers| {
            self.set_timeout(delay, move || {
                resolvers.reject(reason);
                Ok(())
            });
            Ok(())
        })
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
