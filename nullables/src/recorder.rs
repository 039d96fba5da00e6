//! Records every value handed to it, for asserting on emitted events.

use std::sync::{Arc, Mutex, PoisonError};

/// A cloneable sink. Every clone appends to the same log.
#[derive(Debug)]
pub struct EventRecorder<T> {
    seen: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for EventRecorder<T> {
    fn clone(&self) -> Self {
        Self {
            seen: Arc::clone(&self.seen),
        }
    }
}

impl<T> Default for EventRecorder<T> {
    fn default() -> Self {
        Self {
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T: Clone> EventRecorder<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, value: &T) {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(value.clone());
    }

    /// Everything recorded so far, oldest first.
    pub fn recorded(&self) -> Vec<T> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Take everything recorded so far, leaving the log empty.
    pub fn take(&self) -> Vec<T> {
        std::mem::take(&mut *self.seen.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_one_log() {
        let recorder = EventRecorder::new();
        let handle = recorder.clone();
        handle.record(&"a");
        recorder.record(&"b");
        assert_eq!(recorder.recorded(), vec!["a", "b"]);
        assert_eq!(handle.take(), vec!["a", "b"]);
        assert!(recorder.recorded().is_empty());
    }
}
