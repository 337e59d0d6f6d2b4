//! Axis slices.

use std::fmt::Display;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// A half-open, unit step range `start..end` along one axis of an array.
///
/// The end is clamped to be no less than the start on construction, so an [`AxisSlice`] is never inverted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "Range<u64>", into = "Range<u64>")]
pub struct AxisSlice {
    start: u64,
    end: u64,
}

impl From<Range<u64>> for AxisSlice {
    fn from(range: Range<u64>) -> Self {
        Self::new(range.start, range.end)
    }
}

impl From<AxisSlice> for Range<u64> {
    fn from(slice: AxisSlice) -> Self {
        slice.start..slice.end
    }
}

impl Display for AxisSlice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl AxisSlice {
    /// Create a new axis slice spanning `start..end`.
    #[must_use]
    pub const fn new(start: u64, end: u64) -> Self {
        let end = if end < start { start } else { end };
        Self { start, end }
    }

    /// Create an axis slice of length one at `index`.
    #[must_use]
    pub const fn singleton(index: u64) -> Self {
        Self::new(index, index + 1)
    }

    /// Create an axis slice spanning an entire axis of length `len`.
    #[must_use]
    pub const fn full(len: u64) -> Self {
        Self::new(0, len)
    }

    /// The inclusive start.
    #[must_use]
    pub const fn start(&self) -> u64 {
        self.start
    }

    /// The exclusive end.
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.end
    }

    /// The step, always one.
    #[must_use]
    pub const fn step(&self) -> u64 {
        1
    }

    /// The number of elements spanned by the slice.
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Returns true if the slice spans no elements.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// Returns true if `index` is within the slice.
    #[must_use]
    pub const fn contains(&self, index: u64) -> bool {
        index >= self.start && index < self.end
    }

    /// Convert to a [`Range<u64>`].
    #[must_use]
    pub const fn to_range(&self) -> Range<u64> {
        self.start..self.end
    }

    /// Convert to a [`Range<usize>`].
    ///
    /// # Panics
    /// Panics if the start or end exceeds [`usize::MAX`].
    #[must_use]
    pub fn to_range_usize(&self) -> Range<usize> {
        usize::try_from(self.start).unwrap()..usize::try_from(self.end).unwrap()
    }
}
