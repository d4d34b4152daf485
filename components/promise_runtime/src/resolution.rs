//! The promise resolution procedure.
//!
//! Resolving is not settling: a promise resolved with a thenable adopts the
//! thenable's eventual state instead of being fulfilled with the object.

use crate::error::PromiseError;
use crate::promise::{Promise, Settlement};
use core_types::{Function, Value};
use std::cell::Cell;
use std::rc::Rc;

/// Resolves `promise` with `value`.
///
/// - `value` is `promise` itself: reject with a chaining-cycle `TypeError`
/// - `value` is an object whose `then` is callable: adopt it
/// - reading `then` throws: reject with the thrown value
/// - anything else: fulfill with `value`
pub(crate) fn resolve_promise(promise: &Promise, value: Value) {
    if let Some(other) = Promise::from_value(&value) {
        if other.ptr_eq(promise) {
            tracing::debug!(promise = %promise.id(), "promise resolved with itself");
            promise.settle(Settlement::Rejected(PromiseError::ChainingCycle.into()));
            return;
        }
    }

    let Value::Object(object) = &value else {
        promise.settle(Settlement::Fulfilled(value));
        return;
    };
    let then = match Rc::clone(object).then_member() {
        Ok(then) => then,
        Err(thrown) => {
            promise.settle(Settlement::Rejected(thrown));
            return;
        }
    };
    match then {
        Value::Function(then) => adopt_thenable(promise, value, then),
        _ => promise.settle(Settlement::Fulfilled(value)),
    }
}

/// Calls `then` on `thenable` synchronously with a one-shot pair of
/// callbacks. Whichever of them (or a throw) comes first decides.
fn adopt_thenable(promise: &Promise, thenable: Value, then: Function) {
    tracing::trace!(promise = %promise.id(), "adopting thenable");
    let called = Rc::new(Cell::new(false));

    let on_resolve = {
        let (promise, thenable, called) = (promise.clone(), thenable.clone(), called.clone());
        Function::unary(move |resolution| {
            if called.replace(true) {
                return Ok(Value::Undefined);
            }
            // A thenable that resolves with itself is taken as the value.
            if resolution.same_object(&thenable) {
                promise.settle(Settlement::Fulfilled(resolution));
            } else {
                resolve_promise(&promise, resolution);
            }
            Ok(Value::Undefined)
        })
    };
    let on_reject = {
        let (promise, called) = (promise.clone(), called.clone());
        Function::unary(move |reason| {
            if !called.replace(true) {
                promise.settle(Settlement::Rejected(reason));
            }
            Ok(Value::Undefined)
        })
    };

    if let Err(thrown) = then.call(vec![Value::Function(on_resolve), Value::Function(on_reject)]) {
        if !called.replace(true) {
            promise.settle(Settlement::Rejected(thrown));
        }
    }
}
