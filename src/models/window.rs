//! Slot interval model.
//!
//! All times are integer slot indices counted from the meet start. One
//! slot is `slot_minutes` of wall-clock time; conversion to wall-clock
//! happens only at the overview boundary.

use serde::{Deserialize, Serialize};

/// A slot interval [start, end).
///
/// Half-open interval: includes start, excludes end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotWindow {
    /// Start slot (inclusive).
    pub start: i64,
    /// End slot (exclusive).
    pub end: i64,
}

impl SlotWindow {
    /// Creates a new window.
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Length in slots.
    #[inline]
    pub fn len(&self) -> i64 {
        self.end - self.start
    }

    /// Whether the window is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Whether a slot falls within this window.
    #[inline]
    pub fn contains(&self, slot: i64) -> bool {
        slot >= self.start && slot < self.end
    }

    /// Whether two windows overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Free slots between two windows, in either order.
    ///
    /// Negative when the windows overlap (minus the overlap length).
    pub fn gap_to(&self, other: &Self) -> i64 {
        if self.end <= other.start {
            other.start - self.end
        } else if other.end <= self.start {
            self.start - other.end
        } else {
            -(self.end.min(other.end) - self.start.max(other.start))
        }
    }
}
