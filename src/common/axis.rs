//! This module contains the index type used for the discrete T (time) and C (channel) axes, both
//! as the attachment of a ROI to a single slot and as the position a canvas asks about.

use serde::{Deserialize, Serialize};

/// An index along one of the discrete axes. `Any` stands for "every index along the axis": a ROI
/// attached to `Any` is active on every slot, and a query at `Any` does not pin a slot.
///
/// Slots are unit intervals, so `At(i)` covers the half-open range `[i, i + 1)` when it is
/// compared against continuous coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AxisIndex {
    #[default]
    Any,
    At(i32),
}

impl AxisIndex {
    /// Convert from the raw persisted form, where any negative value means `Any`.
    pub fn from_raw(value: i32) -> Self {
        if value < 0 {
            AxisIndex::Any
        } else {
            AxisIndex::At(value)
        }
    }

    /// Convert to the raw persisted form, `-1` for `Any`.
    pub fn to_raw(self) -> i32 {
        match self {
            AxisIndex::Any => -1,
            AxisIndex::At(i) => i,
        }
    }

    pub fn is_any(self) -> bool {
        matches!(self, AxisIndex::Any)
    }

    pub fn index(self) -> Option<i32> {
        match self {
            AxisIndex::Any => None,
            AxisIndex::At(i) => Some(i),
        }
    }

    /// Activity rule between an attachment and a query: either side being `Any` matches,
    /// otherwise the indices must be equal.
    pub fn accepts(self, query: AxisIndex) -> bool {
        match (self, query) {
            (AxisIndex::At(a), AxisIndex::At(b)) => a == b,
            _ => true,
        }
    }

    /// Returns true if the continuous coordinate `v` falls in the slot `[i, i + 1)`.
    pub fn slot_contains(self, v: f64) -> bool {
        match self {
            AxisIndex::Any => true,
            AxisIndex::At(i) => {
                let i = i as f64;
                v >= i && v < i + 1.0
            }
        }
    }

    /// Returns true if the range `[start, end)` lies entirely inside the slot.
    pub fn slot_contains_range(self, start: f64, end: f64) -> bool {
        match self {
            AxisIndex::Any => true,
            AxisIndex::At(i) => {
                let i = i as f64;
                start >= i && end <= i + 1.0
            }
        }
    }

    /// Returns true if the open range `(start, end)` overlaps the slot at all.
    pub fn slot_overlaps(self, start: f64, end: f64) -> bool {
        match self {
            AxisIndex::Any => true,
            AxisIndex::At(i) => {
                let i = i as f64;
                end > i && start < i + 1.0
            }
        }
    }

    /// The (position, size) pair this index contributes to a floating bounding box.
    pub fn extent(self) -> (f64, f64) {
        match self {
            AxisIndex::Any => (f64::NEG_INFINITY, f64::INFINITY),
            AxisIndex::At(i) => (i as f64, 1.0),
        }
    }

    /// The inverse of `extent`: an infinite size or position maps back to `Any`.
    pub fn from_extent(pos: f64, size: f64) -> Self {
        if size == f64::INFINITY || !pos.is_finite() {
            AxisIndex::Any
        } else {
            AxisIndex::At(pos.floor() as i32)
        }
    }
}

impl From<i32> for AxisIndex {
    fn from(value: i32) -> Self {
        AxisIndex::from_raw(value)
    }
}
