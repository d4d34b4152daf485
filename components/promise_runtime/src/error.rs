//! Error types for the promise runtime

use core_types::{JsError, Value};

/// Errors raised synchronously by the promise API, or used as rejection
/// reasons when the runtime itself rejects a promise.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PromiseError {
    /// The constructor argument is not callable.
    #[error("Promise resolver {0} is not a function")]
    ResolverNotCallable(String),

    /// The constructor was invoked as a plain function.
    #[error("Failed to construct 'Promise': Please use the 'new' operator, this object constructor cannot be called as a function.")]
    CalledWithoutNew,

    /// A combinator received something other than an array.
    #[error("You must pass an array to Promise.{0}().")]
    NotAnArray(&'static str),

    /// A promise was resolved with itself.
    #[error("A promises callback cannot return that same promise.")]
    ChainingCycle,
}

impl From<PromiseError> for JsError {
    fn from(err: PromiseError) -> Self {
        JsError::type_error(err.to_string())
    }
}

impl From<PromiseError> for Value {
    fn from(err: PromiseError) -> Self {
        Value::Error(err.into())
    }
}

/// Errors raised while loading a [`crate::RuntimeConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration is not valid JSON for this schema.
    #[error("invalid runtime config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for promise API operations
pub type PromiseResult<T> = Result<T, PromiseError>;
