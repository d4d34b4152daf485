//! Promise runtime for JavaScript execution.
//!
//! This crate provides a Promises/A+ promise primitive and the machinery it
//! runs on:
//! - Event loop with task, microtask and timer queues on a virtual clock
//! - Promise implementation with the standard resolution procedure
//! - `Promise.all` / `Promise.race` combinators
//! - Unhandled rejection tracking with handled/unhandled events
//!
//! # Overview
//!
//! - [`Runtime`] - A realm wired to its own event loop
//! - [`EventLoop`] - Main event loop coordinating task execution
//! - [`Scheduler`] - Where promise jobs are queued
//! - [`Promise`] - Promise/A+ compliant implementation
//! - [`RejectionTracker`] - Reports rejections nobody handled
//! - [`PromiseConstructor`] - The dynamically typed `Promise` global
//!
//! Everything is single-threaded: promises are `Rc` handles and jobs run on
//! the thread that owns the loop.
//!
//! # Examples
//!
//! ## Event Loop Usage
//!
//! ```
//! use promise_runtime::{EventLoop, Task};
//!
//! let event_loop = EventLoop::new();
//! event_loop.enqueue_task(Task::new(|| Ok(())));
//! event_loop.run_until_done().unwrap();
//! ```
//!
//! ## Promise Usage
//!
//! ```
//! use core_types::Value;
//! use promise_runtime::{Promise, PromiseState, Runtime};
//!
//! let runtime = Runtime::new();
//! let all = Promise::all(
//!     runtime.realm(),
//!     vec![Value::Smi(1), Promise::resolve(runtime.realm(), Value::Smi(2)).to_value()],
//! );
//! runtime.run_until_done().unwrap();
//! assert_eq!(
//!     all.state(),
//!     PromiseState::Fulfilled(Value::array(vec![Value::Smi(1), Value::Smi(2)]))
//! );
//! ```
//!
//! ## Rejection Tracking
//!
//! ```
//! use core_types::Value;
//! use promise_runtime::{Promise, Runtime};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let runtime = Runtime::new();
//! let reported = Rc::new(Cell::new(0));
//! let r = reported.clone();
//! runtime
//!     .realm()
//!     .rejection_tracker()
//!     .on_unhandled_rejection(move |_, _| r.set(r.get() + 1));
//!
//! let _ = Promise::reject(runtime.realm(), Value::from("nobody listens"));
//! runtime.run_until_done().unwrap();
//! assert_eq!(reported.get(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod combinators;
pub mod config;
pub mod constructor;
pub mod error;
pub mod event_loop;
pub mod promise;
pub mod realm;
pub mod rejection_tracker;
mod resolution;
pub mod runtime;
pub mod scheduler;
pub mod task_queue;

// Re-export main types at crate root
pub use config::RuntimeConfig;
pub use constructor::PromiseConstructor;
pub use error::{ConfigError, PromiseError, PromiseResult};
pub use event_loop::EventLoop;
pub use promise::{Deferred, Promise, PromiseId, PromiseReaction, PromiseState, Resolvers};
pub use realm::Realm;
pub use rejection_tracker::{ListenerId, RejectionState, RejectionTracker, TrackerStats};
pub use runtime::Runtime;
pub use scheduler::Scheduler;
pub use task_queue::{MicroTask, MicrotaskQueue, Task, TaskQueue, TimerId, TimerQueue};
