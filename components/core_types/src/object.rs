//! Object values and the thenable capability.
//!
//! Promise interop is structural: any object whose `then` member is callable
//! is a thenable, whatever its concrete type. [`Thenable`] is the narrow view
//! the resolution procedure needs, and [`PlainObject`] is a ready-made
//! implementation for host code and tests.

use crate::{Function, Value};
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Structural view of an object as a potential thenable.
///
/// `then_member` is the single member consulted when deciding whether an
/// object is promise-like. Reading it may fail (a throwing getter), in which
/// case the thrown value is returned as `Err`. Objects without a `then`
/// member return `Ok(Value::Undefined)`.
pub trait Thenable: Any {
    /// Reads the object's `then` member.
    fn then_member(self: Rc<Self>) -> Result<Value, Value>;

    /// Upcasts to `Any` so callers can recover the concrete type.
    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;

    /// Tag used when the object is converted to a string.
    fn class_name(&self) -> &'static str {
        "Object"
    }
}

enum ThenSlot {
    Absent,
    Value(Value),
    Getter(Box<dyn Fn() -> Result<Value, Value>>),
}

/// A host object with an optional `then` member.
///
/// # Examples
///
/// ```
/// use core_types::{Function, PlainObject, Value};
///
/// let plain = PlainObject::new().into_value();
/// let thenable = PlainObject::with_then(Function::new(|_| Ok(Value::Undefined))).into_value();
///
/// assert_eq!(plain.to_string(), "[object Object]");
/// assert_ne!(plain, thenable);
/// ```
pub struct PlainObject {
    then: ThenSlot,
}

impl PlainObject {
    /// Creates an object with no `then` member.
    pub fn new() -> Self {
        Self {
            then: ThenSlot::Absent,
        }
    }

    /// Creates an object whose `then` member is the given function.
    pub fn with_then(then: Function) -> Self {
        Self::with_then_value(Value::Function(then))
    }

    /// Creates an object whose `then` member holds an arbitrary value,
    /// callable or not.
    pub fn with_then_value(then: Value) -> Self {
        Self {
            then: ThenSlot::Value(then),
        }
    }

    /// Creates an object whose `then` member is computed on every read.
    ///
    /// The getter may fail, which models a property access that throws.
    pub fn with_then_getter<F>(getter: F) -> Self
    where
        F: Fn() -> Result<Value, Value> + 'static,
    {
        Self {
            then: ThenSlot::Getter(Box::new(getter)),
        }
    }

    /// Wraps the object into a [`Value`].
    pub fn into_value(self) -> Value {
        Value::Object(Rc::new(self))
    }
}

impl Default for PlainObject {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PlainObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let then = match &self.then {
            ThenSlot::Absent => "absent",
            ThenSlot::Value(_) => "value",
            ThenSlot::Getter(_) => "getter",
        };
        f.debug_struct("PlainObject").field("then", &then).finish()
    }
}

impl Thenable for PlainObject {
    fn then_member(self: Rc<Self>) -> Result<Value, Value> {
        match &self.then {
            ThenSlot::Absent => Ok(Value::Undefined),
            ThenSlot::Value(value) => Ok(value.clone()),
            ThenSlot::Getter(getter) => getter(),
        }
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}
