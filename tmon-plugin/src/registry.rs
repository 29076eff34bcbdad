use std::collections::HashMap;

/// Continuation record for a dispatched call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCall {
    pub upstream: String,
    pub dispatched_at_nanos: u64,
}

/// In-flight calls of one plugin instance, keyed by host call id.
///
/// Entries are added on successful dispatch and removed when the host
/// reports completion. Whatever is left at teardown was never answered.
#[derive(Debug, Default)]
pub struct CallRegistry {
    pending: HashMap<u32, PendingCall>,
}

impl CallRegistry {
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }

    /// Record a dispatched call. A reused id replaces the stale record.
    pub fn register(&mut self, call_id: u32, call: PendingCall) {
        if self.pending.insert(call_id, call).is_some() {
            tracing::warn!(call_id, "call id reused while still pending");
        }
    }

    /// Remove and return the record for a completed call.
    pub fn complete(&mut self, call_id: u32) -> Option<PendingCall> {
        self.pending.remove(&call_id)
    }

    /// Drop every pending record, returning how many were abandoned.
    pub fn clear(&mut self) -> usize {
        let n = self.pending.len();
        self.pending.clear();
        n
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
