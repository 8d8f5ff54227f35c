//! Shared test utilities for harness integration tests
//!
//! `MockSut` is a minimal adapter whose state is shared with a probe, so
//! tests can observe live objects and disposal calls from the outside.

#![allow(dead_code)]

use gauge_harness::{AdapterError, MemoryProbe, PropertyValue, ResourceHandle, SutAdapter};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct MockState {
    pub next: u64,
    pub live: BTreeMap<ResourceHandle, BTreeMap<String, PropertyValue>>,
    pub dispose_calls: Vec<ResourceHandle>,
    /// Handle ids whose disposal reports an error
    pub fail_dispose: Vec<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct MockSut {
    pub state: Rc<RefCell<MockState>>,
}

impl MockSut {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probe(&self) -> LiveProbe {
        LiveProbe {
            state: Rc::clone(&self.state),
        }
    }

    pub fn live(&self) -> usize {
        self.state.borrow().live.len()
    }

    pub fn dispose_calls(&self) -> Vec<ResourceHandle> {
        self.state.borrow().dispose_calls.clone()
    }
}

impl SutAdapter for MockSut {
    fn create(&mut self, kind: &str) -> Result<ResourceHandle, AdapterError> {
        if kind != "Widget" {
            return Err(AdapterError::UnsupportedKind(kind.to_string()));
        }
        let mut state = self.state.borrow_mut();
        state.next += 1;
        let handle = ResourceHandle::new(state.next);
        state.live.insert(handle, BTreeMap::new());
        Ok(handle)
    }

    fn set_property(
        &mut self,
        handle: ResourceHandle,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), AdapterError> {
        let mut state = self.state.borrow_mut();
        let props = state
            .live
            .get_mut(&handle)
            .ok_or(AdapterError::UnknownHandle(handle))?;
        props.insert(name.to_string(), value);
        Ok(())
    }

    fn get_property(
        &self,
        handle: ResourceHandle,
        name: &str,
    ) -> Result<PropertyValue, AdapterError> {
        let state = self.state.borrow();
        let props = state
            .live
            .get(&handle)
            .ok_or(AdapterError::UnknownHandle(handle))?;
        props
            .get(name)
            .cloned()
            .ok_or_else(|| AdapterError::InvalidProperty {
                kind: "Widget".to_string(),
                property: name.to_string(),
            })
    }

    fn dispose(&mut self, handle: ResourceHandle) -> Result<(), AdapterError> {
        let mut state = self.state.borrow_mut();
        state.dispose_calls.push(handle);
        state.live.remove(&handle);
        if state.fail_dispose.contains(&handle.id()) {
            return Err(AdapterError::UnknownHandle(handle));
        }
        Ok(())
    }
}

/// Reports the number of live mock objects as memory usage
#[derive(Debug, Clone)]
pub struct LiveProbe {
    state: Rc<RefCell<MockState>>,
}

impl MemoryProbe for LiveProbe {
    fn current_usage(&self) -> Option<f64> {
        Some(self.state.borrow().live.len() as f64)
    }

    fn unit(&self) -> &'static str {
        "objects"
    }
}
