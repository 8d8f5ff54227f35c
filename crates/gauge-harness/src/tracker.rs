//! Resource tracker - scoped ownership of SUT objects
//!
//! Every object a test creates is handed to the tracker. `cleanup` disposes
//! each tracked handle exactly once, whatever happened to the test that made
//! it, and swallows disposal failures.

use crate::adapter::{ResourceHandle, SutAdapter};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Owns every handle created during a run until cleanup
///
/// Handles are kept in registration order, keyed by a sequence number so
/// that tracking and early release stay cheap however many are live.
#[derive(Debug, Default)]
pub struct ResourceTracker {
    order: BTreeMap<u64, ResourceHandle>,
    seq_of: HashMap<ResourceHandle, u64>,
    next_seq: u64,
}

impl ResourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `handle` and hand it back for chaining
    pub fn track(&mut self, handle: ResourceHandle) -> ResourceHandle {
        if !self.seq_of.contains_key(&handle) {
            self.seq_of.insert(handle, self.next_seq);
            self.order.insert(self.next_seq, handle);
            self.next_seq += 1;
        }
        handle
    }

    /// Dispose one handle early and stop tracking it.
    ///
    /// Returns whether disposal succeeded; failures are swallowed like in
    /// [`ResourceTracker::cleanup`].
    pub fn release(&mut self, handle: ResourceHandle, adapter: &mut dyn SutAdapter) -> bool {
        if let Some(seq) = self.seq_of.remove(&handle) {
            self.order.remove(&seq);
        }
        match adapter.dispose(handle) {
            Ok(()) => true,
            Err(e) => {
                debug!(%handle, error = %e, "early release failed");
                false
            }
        }
    }

    /// Dispose every tracked handle once and clear the set.
    ///
    /// Returns the number of disposal attempts made.
    pub fn cleanup(&mut self, adapter: &mut dyn SutAdapter) -> usize {
        let handles = std::mem::take(&mut self.order);
        self.seq_of.clear();
        let attempts = handles.len();
        let mut failures = 0usize;
        for handle in handles.into_values() {
            if let Err(e) = adapter.dispose(handle) {
                failures += 1;
                debug!(%handle, error = %e, "disposal failed during cleanup");
            }
        }
        debug!(attempts, failures, "resource cleanup finished");
        attempts
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Tracked handles, oldest first
    pub fn handles(&self) -> impl Iterator<Item = ResourceHandle> + '_ {
        self.order.values().copied()
    }
}
