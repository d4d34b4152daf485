//! Unit tests for Promise

use super::{recorder, rethrow, swallow};
use core_types::{Function, JsError, Thenable, Value};
use promise_runtime::{Promise, PromiseState, Runtime};
use std::cell::RefCell;
use std::rc::Rc;

fn push(log: &Rc<RefCell<Vec<&'static str>>>, entry: &'static str) -> Function {
    let log = log.clone();
    Function::unary(move |value| {
        log.borrow_mut().push(entry);
        Ok(value)
    })
}

#[test]
fn executor_runs_synchronously() {
    let runtime = Runtime::new();
    let ran = Rc::new(RefCell::new(false));
    let r = ran.clone();
    let _promise = Promise::new(runtime.realm(), move |_| {
        *r.borrow_mut() = true;
        Ok(())
    });
    assert!(*ran.borrow());
}

#[test]
fn resolve_returns_same_promise_for_promises() {
    let runtime = Runtime::new();
    let original = Promise::deferred(runtime.realm()).promise;
    let resolved = Promise::resolve(runtime.realm(), original.to_value());
    assert!(resolved.ptr_eq(&original));
}

#[test]
fn reject_does_not_unwrap_promises() {
    let runtime = Runtime::new();
    let inner = Promise::resolve(runtime.realm(), Value::Smi(1));
    let rejected = Promise::reject(runtime.realm(), inner.to_value());
    let _ = rejected.catch(swallow());
    assert_eq!(rejected.state(), PromiseState::Rejected(inner.to_value()));
}

#[test]
fn handlers_run_in_registration_order() {
    let runtime = Runtime::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let deferred = Promise::deferred(runtime.realm());

    deferred.promise.then(Some(push(&log, "first")), None);
    deferred.promise.then(Some(push(&log, "second")), None);
    deferred.promise.then(Some(push(&log, "third")), None);

    deferred.resolve.call(vec![Value::Undefined]).unwrap();
    assert!(log.borrow().is_empty());

    runtime.run_until_done().unwrap();
    assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
}

#[test]
fn independent_chains_interleave_by_step() {
    let runtime = Runtime::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let a = Promise::resolve(runtime.realm(), Value::Undefined);
    let b = Promise::resolve(runtime.realm(), Value::Undefined);

    a.then(Some(push(&log, "a1")), None)
        .then(Some(push(&log, "a2")), None);
    b.then(Some(push(&log, "b1")), None)
        .then(Some(push(&log, "b2")), None);

    runtime.run_until_done().unwrap();
    assert_eq!(*log.borrow(), vec!["a1", "b1", "a2", "b2"]);
}

#[test]
fn handler_return_value_fulfills_derived() {
    let runtime = Runtime::new();
    let derived = Promise::resolve(runtime.realm(), Value::Smi(20)).then(
        Some(Function::unary(|v| match v {
            Value::Smi(n) => Ok(Value::Smi(n + 1)),
            other => Err(other),
        })),
        None,
    );
    runtime.run_until_done().unwrap();
    assert_eq!(derived.state(), PromiseState::Fulfilled(Value::Smi(21)));
}

#[test]
fn handler_error_rejects_derived() {
    let runtime = Runtime::new();
    let derived = Promise::resolve(runtime.realm(), Value::from("oops")).then(Some(rethrow()), None);
    let _ = derived.catch(swallow());
    runtime.run_until_done().unwrap();
    assert_eq!(derived.state(), PromiseState::Rejected(Value::from("oops")));
}

#[test]
fn catch_recovers_the_chain() {
    let runtime = Runtime::new();
    let (seen, on_fulfilled) = recorder();
    let error: Value = JsError::type_error("bad").into();

    Promise::reject(runtime.realm(), error.clone())
        .then(Some(rethrow()), None)
        .catch(Function::unary(|_| Ok(Value::from("recovered"))))
        .then(Some(on_fulfilled), None);

    runtime.run_until_done().unwrap();
    assert_eq!(*seen.borrow(), vec![Value::from("recovered")]);
}

#[test]
fn returning_a_promise_adopts_it() {
    let runtime = Runtime::new();
    let realm = runtime.realm().clone();
    let inner = Promise::deferred(&realm);
    let inner_value = inner.promise.to_value();

    let derived = Promise::resolve(&realm, Value::Undefined)
        .then(Some(Function::unary(move |_| Ok(inner_value.clone()))), None);
    runtime.run_until_done().unwrap();
    assert!(derived.is_pending());

    inner.resolve.call(vec![Value::Smi(5)]).unwrap();
    runtime.run_until_done().unwrap();
    assert_eq!(derived.state(), PromiseState::Fulfilled(Value::Smi(5)));
}

#[test]
fn handler_returning_its_own_derived_promise_rejects() {
    let runtime = Runtime::new();
    let slot: Rc<RefCell<Option<Promise>>> = Rc::default();
    let s = slot.clone();
    let derived = Promise::resolve(runtime.realm(), Value::Undefined).then(
        Some(Function::unary(move |_| {
            Ok(s.borrow().as_ref().map(Promise::to_value).unwrap_or(Value::Undefined))
        })),
        None,
    );
    *slot.borrow_mut() = Some(derived.clone());
    let _ = derived.catch(swallow());

    runtime.run_until_done().unwrap();
    slot.borrow_mut().take();
    match derived.state() {
        PromiseState::Rejected(Value::Error(err)) => {
            assert_eq!(err.message, "A promises callback cannot return that same promise.");
        }
        other => panic!("expected TypeError rejection, got {:?}", other),
    }
}

#[test]
fn then_member_callable_through_value() {
    let runtime = Runtime::new();
    let (seen, on_fulfilled) = recorder();
    let promise = Promise::resolve(runtime.realm(), Value::Smi(3)).to_value();

    let Value::Object(object) = &promise else {
        panic!("promise should be an object");
    };
    let then = Rc::clone(object).then_member().unwrap();
    let derived = then
        .as_function()
        .unwrap()
        .call(vec![Value::Function(on_fulfilled), Value::Smi(0)])
        .unwrap();

    runtime.run_until_done().unwrap();
    assert_eq!(*seen.borrow(), vec![Value::Smi(3)]);
    assert!(Promise::from_value(&derived).is_some());
}

#[test]
fn deferred_capabilities_are_one_shot() {
    let runtime = Runtime::new();
    let deferred = Promise::deferred(runtime.realm());
    deferred.reject.call(vec![Value::Smi(1)]).unwrap();
    deferred.resolve.call(vec![Value::Smi(2)]).unwrap();
    let _ = deferred.promise.catch(swallow());
    assert_eq!(deferred.promise.state(), PromiseState::Rejected(Value::Smi(1)));
}

#[test]
fn resolving_with_pending_promise_locks_in() {
    let runtime = Runtime::new();
    let inner = Promise::deferred(runtime.realm());
    let outer = Promise::deferred(runtime.realm());

    outer.resolve.call(vec![inner.promise.to_value()]).unwrap();
    // Locked in: a later reject is ignored even though outer is pending.
    outer.reject.call(vec![Value::Smi(0)]).unwrap();
    runtime.run_until_done().unwrap();
    assert!(outer.promise.is_pending());

    inner.resolve.call(vec![Value::Smi(9)]).unwrap();
    runtime.run_until_done().unwrap();
    assert_eq!(outer.promise.state(), PromiseState::Fulfilled(Value::Smi(9)));
}
