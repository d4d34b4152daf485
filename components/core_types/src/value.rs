//! JavaScript value representation.
//!
//! [`Value`] is the type-erased payload carried by promises: fulfillment
//! values, rejection reasons, and anything a callback returns or throws.

use crate::{Function, JsError, Thenable};
use std::fmt;
use std::rc::Rc;

/// Represents any JavaScript value.
///
/// Primitives are stored inline and compare by value. Arrays compare
/// element-wise; functions and objects compare by identity.
///
/// # Examples
///
/// ```
/// use core_types::Value;
///
/// let undefined = Value::Undefined;
/// let number = Value::Smi(42);
/// let list = Value::array(vec![Value::Smi(1), Value::Smi(2)]);
///
/// assert_ne!(undefined, number);
/// assert_eq!(list.as_array().map(|items| items.len()), Some(2));
/// ```
#[derive(Clone)]
pub enum Value {
    /// JavaScript undefined value
    Undefined,
    /// JavaScript null value
    Null,
    /// JavaScript boolean (true or false)
    Boolean(bool),
    /// Small integer
    Smi(i32),
    /// JavaScript string value
    String(std::string::String),
    /// Ordered, indexable sequence
    Array(Rc<Vec<Value>>),
    /// Callable value
    Function(Function),
    /// Host object, possibly thenable (promises included)
    Object(Rc<dyn Thenable>),
    /// Error object
    Error(JsError),
}

impl Value {
    /// Builds an array value.
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(items))
    }

    /// Returns the elements if this value is an array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Returns the function if this value is callable.
    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(func) => Some(func),
            _ => None,
        }
    }

    /// Returns true if this value can be called.
    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    /// Returns true if both values are the same object or function.
    ///
    /// Always false for primitives and arrays.
    pub fn same_object(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => {
                Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
            }
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
            Value::Smi(n) => f.debug_tuple("Smi").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Array(items) => f.debug_tuple("Array").field(items).finish(),
            Value::Function(_) => write!(f, "Function(...)"),
            Value::Object(obj) => write!(f, "Object({})", obj.class_name()),
            Value::Error(err) => f.debug_tuple("Error").field(err).finish(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Smi(a), Value::Smi(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Function(_), Value::Function(_)) | (Value::Object(_), Value::Object(_)) => {
                self.same_object(other)
            }
            _ => false,
        }
    }
}

impl From<JsError> for Value {
    fn from(err: JsError) -> Self {
        Value::Error(err)
    }
}

impl From<Function> for Value {
    fn from(func: Function) -> Self {
        Value::Function(func)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Smi(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

/// JavaScript `String()` conversion, simplified.
///
/// ```
/// use core_types::Value;
///
/// assert_eq!(Value::Undefined.to_string(), "undefined");
/// assert_eq!(Value::String("unicorns".into()).to_string(), "unicorns");
/// assert_eq!(Value::array(vec![Value::Smi(1), Value::Smi(2)]).to_string(), "1,2");
/// ```
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Smi(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    if !matches!(item, Value::Undefined | Value::Null) {
                        write!(f, "{}", item)?;
                    }
                }
                Ok(())
            }
            Value::Function(_) => write!(f, "function () {{ [native code] }}"),
            Value::Object(obj) => write!(f, "[object {}]", obj.class_name()),
            Value::Error(err) => write!(f, "{}", err),
        }
    }
}
