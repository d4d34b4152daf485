//! Promise constructor for the global scope.
//!
//! Mirrors the dynamically typed surface: arguments arrive as [`Value`]s and
//! misuse surfaces as a synchronous [`PromiseError`].

use crate::error::{PromiseError, PromiseResult};
use crate::promise::Promise;
use crate::realm::Realm;
use core_types::Value;

/// The `Promise` global of a realm.
#[derive(Debug, Clone)]
pub struct PromiseConstructor {
    realm: Realm,
}

impl PromiseConstructor {
    /// Binds a constructor to `realm`.
    pub fn new(realm: &Realm) -> Self {
        Self {
            realm: realm.clone(),
        }
    }

    /// `new Promise(executor)`.
    ///
    /// The executor is called synchronously with `resolve` and `reject`. A
    /// throw from it rejects the promise.
    pub fn construct(&self, executor: &Value) -> PromiseResult<Value> {
        let Value::Function(executor) = executor else {
            return Err(PromiseError::ResolverNotCallable(executor.to_string()));
        };
        let executor = executor.clone();
        let promise = Promise::new(&self.realm, move |resolvers| {
            executor
                .call(vec![
                    resolvers.resolve_function().into(),
                    resolvers.reject_function().into(),
                ])
                .map(|_| ())
        });
        Ok(promise.to_value())
    }

    /// `Promise(executor)` without `new`. Always an error.
    pub fn call(&self, _executor: &Value) -> PromiseResult<Value> {
        Err(PromiseError::CalledWithoutNew)
    }

    /// `Promise.resolve(value)`.
    pub fn resolve(&self, value: Value) -> Value {
        Promise::resolve(&self.realm, value).to_value()
    }

    /// `Promise.reject(reason)`.
    pub fn reject(&self, reason: Value) -> Value {
        Promise::reject(&self.realm, reason).to_value()
    }

    /// `Promise.all(items)`. `items` must be an array.
    pub fn all(&self, items: &Value) -> PromiseResult<Value> {
        let items = items.as_array().ok_or(PromiseError::NotAnArray("all"))?;
        Ok(Promise::all(&self.realm, items.to_vec()).to_value())
    }

    /// `Promise.race(items)`. `items` must be an array.
    pub fn race(&self, items: &Value) -> PromiseResult<Value> {
        let items = items.as_array().ok_or(PromiseError::NotAnArray("race"))?;
        Ok(Promise::race(&self.realm, items.to_vec()).to_value())
    }

    /// Returns true if `value` is a promise object.
    pub fn is_promise(value: &Value) -> bool {
        Promise::from_value(value).is_some()
    }
}
