// src/change_detector.rs
//! Decides whether two snapshots of the same source differ in a way worth reporting.

/// Seam between the snapshot store and the comparison rule. Structured sources
/// swap in their own detector; plain pages stay byte-exact.
pub trait ChangeDetector<T: ?Sized>: Send + Sync {
    fn has_changed(&self, old: &T, new: &T) -> bool;
}

/// Exact equality. For text this is a byte-for-byte comparison, no whitespace normalization.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatch;

impl<T: PartialEq + ?Sized> ChangeDetector<T> for ExactMatch {
    fn has_changed(&self, old: &T, new: &T) -> bool {
        old != new
    }
}
