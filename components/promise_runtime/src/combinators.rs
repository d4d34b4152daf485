//! `Promise.all` and `Promise.race`.

use crate::promise::{Promise, Settlement};
use crate::realm::Realm;
use core_types::{Function, Value};
use std::cell::RefCell;
use std::rc::Rc;

struct AllState {
    values: Vec<Value>,
    remaining: usize,
}

impl Promise {
    /// Fulfills with the values of all `items`, in input order, once every
    /// item has fulfilled. Rejects with the first rejection.
    ///
    /// Non-promise items count as already fulfilled. An empty input fulfills
    /// immediately with an empty array.
    pub fn all(realm: &Realm, items: Vec<Value>) -> Promise {
        let result = Promise::pending(realm);
        tracing::trace!(promise = %result.id(), entries = items.len(), "Promise.all");
        if items.is_empty() {
            result.settle(Settlement::Fulfilled(Value::array(Vec::new())));
            return result;
        }

        let state = Rc::new(RefCell::new(AllState {
            values: vec![Value::Undefined; items.len()],
            remaining: items.len(),
        }));
        for (index, item) in items.into_iter().enumerate() {
            let on_fulfilled = {
                let (state, result) = (state.clone(), result.clone());
                Function::unary(move |value| {
                    let complete = {
                        let mut state = state.borrow_mut();
                        state.values[index] = value;
                        state.remaining -= 1;
                        (state.remaining == 0).then(|| std::mem::take(&mut state.values))
                    };
                    if let Some(values) = complete {
                        result.settle(Settlement::Fulfilled(Value::array(values)));
                    }
                    Ok(Value::Undefined)
                })
            };
            Promise::resolve(realm, item).then(Some(on_fulfilled), Some(settle_rejected(&result)));
        }
        result
    }

    /// Settles like whichever of `items` settles first.
    ///
    /// Non-promise items count as already fulfilled. An empty input stays
    /// pending forever.
    pub fn race(realm: &Realm, items: Vec<Value>) -> Promise {
        let result = Promise::pending(realm);
        tracing::trace!(promise = %result.id(), entries = items.len(), "Promise.race");
        for item in items {
            let on_fulfilled = {
                let result = result.clone();
                Function::unary(move |value| {
                    result.settle(Settlement::Fulfilled(value));
                    Ok(Value::Undefined)
                })
            };
            Promise::resolve(realm, item).then(Some(on_fulfilled), Some(settle_rejected(&result)));
        }
        result
    }
}

fn settle_rejected(result: &Promise) -> Function {
    let result = result.clone();
    Function::unary(move |reason| {
        result.settle(Settlement::Rejected(reason));
        Ok(Value::Undefined)
    })
}
