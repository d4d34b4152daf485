//! Core JavaScript value types and error handling.
//!
//! This crate provides the foundational types shared by the promise runtime:
//! the type-erased [`Value`] carried through fulfillments and rejections, the
//! [`Function`] callable, the [`Thenable`] capability used for promise
//! interop, and [`JsError`].
//!
//! # Overview
//!
//! - [`Value`] - Tagged representation of JavaScript values
//! - [`Function`] - Shared callable returning a value or a thrown value
//! - [`Thenable`] - Structural "has a `then` member" capability
//! - [`PlainObject`] - Host object with an optional `then` member
//! - [`JsError`] / [`ErrorKind`] - JavaScript errors
//!
//! # Examples
//!
//! ```
//! use core_types::{Function, JsError, Value};
//!
//! let list = Value::array(vec![Value::Smi(42), Value::Null]);
//! assert_eq!(list.to_string(), "42,");
//!
//! let thrower = Function::new(|_| Err(JsError::type_error("nope").into()));
//! assert!(thrower.call(vec![]).is_err());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod function;
mod object;
mod value;

pub use error::{ErrorKind, JsError};
pub use function::Function;
pub use object::{PlainObject, Thenable};
pub use value::Value;
