//! Promises/A+ style checks through the deferred adapter
//!
//! Compliance suites drive an implementation through three entry points:
//! `resolved(value)`, `rejected(reason)` and `deferred()`. These tests use
//! the same shape.

use core_types::{Function, PlainObject, Value};
use integration_tests::{init_test_logging, recorder, swallow};
use promise_runtime::{Deferred, Promise, PromiseState, Realm, Runtime};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

struct Adapter {
    runtime: Runtime,
}

impl Adapter {
    fn new() -> Self {
        init_test_logging();
        Self {
            runtime: Runtime::new(),
        }
    }

    fn realm(&self) -> &Realm {
        self.runtime.realm()
    }

    fn resolved(&self, value: Value) -> Promise {
        Promise::resolve(self.realm(), value)
    }

    fn rejected(&self, reason: Value) -> Promise {
        Promise::reject(self.realm(), reason)
    }

    fn deferred(&self) -> Deferred {
        Promise::deferred(self.realm())
    }

    fn flush(&self) {
        self.runtime.run_until_done().unwrap();
    }
}

#[test]
fn test_on_fulfilled_not_called_before_fulfillment() {
    let adapter = Adapter::new();
    let deferred = adapter.deferred();
    let (seen, on_fulfilled) = recorder();
    deferred.promise.then(Some(on_fulfilled), None);

    adapter.flush();
    assert!(seen.borrow().is_empty());

    deferred.resolve.call(vec![Value::Smi(1)]).unwrap();
    adapter.flush();
    assert_eq!(*seen.borrow(), vec![Value::Smi(1)]);
}

#[test]
fn test_on_rejected_called_once_with_reason() {
    let adapter = Adapter::new();
    let deferred = adapter.deferred();
    let (seen, on_rejected) = recorder();
    deferred.promise.then(None, Some(on_rejected));

    deferred.reject.call(vec![Value::from("r")]).unwrap();
    deferred.reject.call(vec![Value::from("again")]).unwrap();
    adapter.flush();
    assert_eq!(*seen.borrow(), vec![Value::from("r")]);
}

#[test]
fn test_handlers_called_without_this_and_after_stack_unwinds() {
    let adapter = Adapter::new();
    let unwound = Rc::new(Cell::new(false));
    let observed = Rc::new(Cell::new(false));

    let (u, o) = (unwound.clone(), observed.clone());
    adapter.resolved(Value::Undefined).then(
        Some(Function::unary(move |_| {
            o.set(u.get());
            Ok(Value::Undefined)
        })),
        None,
    );
    unwound.set(true);

    adapter.flush();
    assert!(observed.get());
}

#[test]
fn test_non_function_handlers_are_ignored() {
    let adapter = Adapter::new();
    let promise = adapter.resolved(Value::Smi(3));
    let Value::Object(object) = promise.to_value() else {
        panic!("promise is an object");
    };
    let then = core_types::Thenable::then_member(object).unwrap();
    let derived = then
        .as_function()
        .unwrap()
        .call(vec![Value::Null, Value::from("not a function")])
        .unwrap();

    adapter.flush();
    let derived = Promise::from_value(&derived).unwrap();
    assert_eq!(derived.state(), PromiseState::Fulfilled(Value::Smi(3)));
}

#[test]
fn test_multiple_then_calls_fire_in_order() {
    let adapter = Adapter::new();
    let order = Rc::new(RefCell::new(Vec::new()));
    let promise = adapter.rejected(Value::Smi(0));

    for tag in 1..=3 {
        let o = order.clone();
        promise.then(
            None,
            Some(Function::unary(move |_| {
                o.borrow_mut().push(tag);
                Ok(Value::Undefined)
            })),
        );
    }
    adapter.flush();
    assert_eq!(*order.borrow(), vec![1, 2, 3]);
}

#[test]
fn test_thenable_calling_both_callbacks_uses_first() {
    let adapter = Adapter::new();
    let thenable = PlainObject::with_then(Function::new(|args| {
        if let [Value::Function(resolve), Value::Function(reject)] = args.as_slice() {
            reject.call(vec![Value::from("first")])?;
            resolve.call(vec![Value::from("second")])?;
        }
        Ok(Value::Undefined)
    }))
    .into_value();

    let derived = adapter
        .resolved(Value::Undefined)
        .then(Some(Function::unary(move |_| Ok(thenable.clone()))), None);
    let _ = derived.catch(swallow());
    adapter.flush();
    assert_eq!(derived.state(), PromiseState::Rejected(Value::from("first")));
}

#[test]
fn test_already_fulfilled_promise_with_late_then() {
    let adapter = Adapter::new();
    let promise = adapter.resolved(Value::from("dummy"));
    adapter.flush();

    let (seen, on_fulfilled) = recorder();
    promise.then(Some(on_fulfilled), None);
    assert!(seen.borrow().is_empty());
    adapter.flush();
    assert_eq!(*seen.borrow(), vec![Value::from("dummy")]);
}
