// src/snapshot.rs
//! Last-seen snapshot of a single source.

use parking_lot::Mutex;

use crate::change_detector::{ChangeDetector, ExactMatch};

/// Holds the most recent successfully fetched value for one source.
///
/// `None` means the source has never been fetched, so an empty body is still a
/// real baseline. Compare and swap happen under one lock; concurrent pollers of
/// the same source never observe a half-updated value.
#[derive(Debug)]
pub struct SnapshotStore<T, D = ExactMatch> {
    inner: Mutex<Option<T>>,
    detector: D,
}

impl<T> SnapshotStore<T, ExactMatch> {
    pub fn new() -> Self {
        Self::with_detector(ExactMatch)
    }
}

impl<T> Default for SnapshotStore<T, ExactMatch> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, D> SnapshotStore<T, D> {
    pub fn with_detector(detector: D) -> Self {
        Self {
            inner: Mutex::new(None),
            detector,
        }
    }

    /// Preload a baseline, e.g. a value carried over from a previous run.
    pub fn with_baseline(mut self, value: T) -> Self {
        *self.inner.get_mut() = Some(value);
        self
    }

    pub fn is_seeded(&self) -> bool {
        self.inner.lock().is_some()
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }
}

impl<T: Clone, D> SnapshotStore<T, D> {
    pub fn current(&self) -> Option<T> {
        self.inner.lock().clone()
    }
}

impl<T, D: ChangeDetector<T>> SnapshotStore<T, D> {
    /// Store `new` and report whether it differs from the previous snapshot.
    ///
    /// The first value ever stored is a baseline and never reports a change.
    /// The stored value is replaced on every call, changed or not.
    pub fn compare_and_update(&self, new: T) -> bool {
        let mut slot = self.inner.lock();
        let changed = match slot.as_ref() {
            None => false,
            Some(old) => self.detector.has_changed(old, &new),
        };
        *slot = Some(new);
        changed
    }
}
