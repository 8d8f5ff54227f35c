//! Error taxonomy for the harness
//!
//! Failures inside a test body are [`TestError`]s and never escape the
//! runner; they become outcomes. [`HarnessError`] covers the driver itself.

use crate::adapter::ResourceHandle;
use std::fmt::Debug;
use thiserror::Error;

/// Errors reported by a SUT adapter
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdapterError {
    #[error("unsupported kind '{0}'")]
    UnsupportedKind(String),

    #[error("invalid property '{property}' for kind '{kind}'")]
    InvalidProperty { kind: String, property: String },

    #[error("type mismatch for '{property}': expected {expected}, found {found}")]
    TypeMismatch {
        property: String,
        expected: String,
        found: String,
    },

    #[error("unknown or disposed handle {0}")]
    UnknownHandle(ResourceHandle),
}

/// Failure of a single test body
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TestError {
    /// An expected-value check did not hold
    #[error("assertion failed: {0}")]
    Assertion(String),

    /// The SUT adapter rejected an operation
    #[error("adapter rejected operation: {0}")]
    Adapter(#[from] AdapterError),

    /// The body panicked; caught by the runner's failure boundary
    #[error("panicked: {0}")]
    Panicked(String),
}

/// Errors raised by the harness driver
#[derive(Error, Debug)]
pub enum HarnessError {
    /// A fault outside any test boundary. Cleanup has already run.
    #[error("driver fault: {0}")]
    DriverFault(String),

    #[error("test '{name}' registered with weight 0; weights must be positive")]
    InvalidWeight { name: String },
}

/// Result type for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Fail with an assertion error unless `condition` holds
pub fn ensure(condition: bool, message: impl Into<String>) -> Result<(), TestError> {
    if condition {
        Ok(())
    } else {
        Err(TestError::Assertion(message.into()))
    }
}

/// Fail with an assertion error unless `actual == expected`
pub fn ensure_eq<T>(actual: T, expected: T, what: &str) -> Result<(), TestError>
where
    T: PartialEq + Debug,
{
    if actual == expected {
        Ok(())
    } else {
        Err(TestError::Assertion(format!(
            "{}: expected {:?}, got {:?}",
            what, expected, actual
        )))
    }
}

/// Turn a caught panic payload into readable text
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
