//! Callable values.

use crate::Value;
use std::fmt;
use std::rc::Rc;

/// A function that can be called with arguments.
///
/// `Ok` carries the return value; `Err` carries the thrown value, which may be
/// any [`Value`]. Functions are shared handles: cloning yields the same
/// function, and equality is identity.
///
/// # Examples
///
/// ```
/// use core_types::{Function, Value};
///
/// let double = Function::new(|args| match args.first() {
///     Some(Value::Smi(n)) => Ok(Value::Smi(n * 2)),
///     _ => Err(Value::String("expected a number".to_string())),
/// });
///
/// assert_eq!(double.call(vec![Value::Smi(21)]), Ok(Value::Smi(42)));
/// assert!(double.call(vec![]).is_err());
/// ```
#[derive(Clone)]
pub struct Function {
    callback: Rc<dyn Fn(Vec<Value>) -> Result<Value, Value>>,
}

impl Function {
    /// Creates a new Function from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value, Value> + 'static,
    {
        Self {
            callback: Rc::new(f),
        }
    }

    /// Creates a Function that only looks at its first argument
    /// (`undefined` when called without one).
    pub fn unary<F>(f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, Value> + 'static,
    {
        Self::new(move |args| f(args.into_iter().next().unwrap_or(Value::Undefined)))
    }

    /// Calls the function with the given arguments.
    pub fn call(&self, args: Vec<Value>) -> Result<Value, Value> {
        (self.callback)(args)
    }

    /// Returns true if both handles refer to the same function.
    pub fn ptr_eq(&self, other: &Function) -> bool {
        Rc::as_ptr(&self.callback) as *const () == Rc::as_ptr(&other.callback) as *const ()
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function {{ ... }}")
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}
