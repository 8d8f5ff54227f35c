//! SUT adapter interface
//!
//! The harness never knows what the subject under test does; it only talks to
//! it through [`SutAdapter`]: create an object of some kind, read and write
//! named properties, and dispose of it.

use crate::error::AdapterError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle to an object created by the SUT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceHandle(u64);

impl ResourceHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Property value exchanged with the SUT
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum PropertyValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Color { r: u8, g: u8, b: u8 },
    Handle(Option<ResourceHandle>),
}

impl PropertyValue {
    /// Name of the value's type, used in mismatch diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Number(_) => "number",
            PropertyValue::Text(_) => "text",
            PropertyValue::Color { .. } => "color",
            PropertyValue::Handle(_) => "handle",
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Number(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Text(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::Text(v)
    }
}

impl From<ResourceHandle> for PropertyValue {
    fn from(v: ResourceHandle) -> Self {
        PropertyValue::Handle(Some(v))
    }
}

/// Capability interface implemented by the subject under test
pub trait SutAdapter {
    /// Create an object; fails with `UnsupportedKind` for unknown kinds
    fn create(&mut self, kind: &str) -> Result<ResourceHandle, AdapterError>;

    /// Set a property; fails with `InvalidProperty` or `TypeMismatch`
    fn set_property(
        &mut self,
        handle: ResourceHandle,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), AdapterError>;

    fn get_property(
        &self,
        handle: ResourceHandle,
        name: &str,
    ) -> Result<PropertyValue, AdapterError>;

    /// Dispose of an object. Must be idempotent: disposing twice is not a fault.
    fn dispose(&mut self, handle: ResourceHandle) -> Result<(), AdapterError>;
}
