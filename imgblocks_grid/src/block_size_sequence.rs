//! The average block size of split specs along a fixed refinement path.
//!
//! A [`BlockSizeSequence`] orders split specs from the coarsest (a single block) to the finest (one element per block).
//! Starting from all ones, the split count of the last axis is incremented until it equals the size of that axis.
//! Then the next-to-last axis is refined in the same way, and so on up to the first axis.
//!
//! For example, the refinement path of an array with shape `[5, 10, 3]` is
//! ```text
//! [1, 1, 1], [1, 1, 2], [1, 1, 3], [1, 2, 3], ..., [1, 10, 3], [2, 10, 3], ..., [5, 10, 3]
//! ```
//! and the average number of elements in a block along that path is
//! ```text
//! 150, 75, 50, 25, ..., 5, 2.5, ..., 1
//! ```
//!
//! The sequence is never materialised.
//! Its values are non-increasing, so its [`ReversedBlockSizeSequence`] is non-decreasing and can be searched with [`bisect_left`].
//! The path does not visit every possible split spec, and a closer match to a requested block size may exist off the path.

use crate::{ArrayShape, SplitSpec};

/// A sequence with values computed on demand.
pub trait IndexedSequence {
    /// The number of elements in the sequence.
    fn len(&self) -> u64;

    /// Returns true if the sequence has no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The value at `index`.
    ///
    /// Returns [`None`] if `index` is out-of-bounds.
    fn get(&self, index: u64) -> Option<f64>;
}

impl<T: IndexedSequence + ?Sized> IndexedSequence for &T {
    fn len(&self) -> u64 {
        (**self).len()
    }

    fn get(&self, index: u64) -> Option<f64> {
        (**self).get(index)
    }
}

/// Return the leftmost index of a non-decreasing `sequence` at which `value` could be inserted while keeping it sorted.
///
/// This is the index of the first element that is not less than `value`, or [`len`](IndexedSequence::len) if every element is less than `value`.
#[must_use]
pub fn bisect_left<S: IndexedSequence + ?Sized>(sequence: &S, value: f64) -> u64 {
    let mut low = 0;
    let mut high = sequence.len();
    while low < high {
        let mid = low + (high - low) / 2;
        match sequence.get(mid) {
            Some(mid_value) if mid_value < value => low = mid + 1,
            _ => high = mid,
        }
    }
    low
}

/// The average number of elements in a block for each split spec along the refinement path of an array shape.
///
/// See the [module documentation](self).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockSizeSequence {
    dims: ArrayShape,
}

impl BlockSizeSequence {
    /// Create a new block size sequence for an array with shape `dims`.
    #[must_use]
    pub fn new(dims: ArrayShape) -> Self {
        Self { dims }
    }

    /// The array shape.
    #[must_use]
    pub fn dims(&self) -> &[u64] {
        &self.dims
    }

    /// Return a view of the sequence in reverse order (finest to coarsest split spec).
    #[must_use]
    pub fn reversed(&self) -> ReversedBlockSizeSequence<'_> {
        ReversedBlockSizeSequence { sequence: self }
    }

    /// Convert a linearised index along the refinement path to a split spec.
    ///
    /// Index `0` is all ones and index `len() - 1` is equal to the array shape.
    /// Indices beyond the end of the path saturate at the array shape.
    #[must_use]
    pub fn index_to_split_spec(&self, index: u64) -> SplitSpec {
        let mut remaining = index;
        let mut splits = vec![1; self.dims.len()];
        for (splits_i, &dim) in std::iter::zip(splits.iter_mut(), &self.dims).rev() {
            if remaining == 0 {
                break;
            }
            let delta = std::cmp::min(dim.saturating_sub(1), remaining);
            *splits_i += delta;
            remaining -= delta;
        }
        SplitSpec::new_unchecked(splits)
    }

    /// Convert a split spec to its linearised index along the refinement path.
    ///
    /// Returns [`None`] if the split spec is not on the refinement path, or does not match the array dimensionality.
    #[must_use]
    pub fn split_spec_to_index(&self, split_spec: &SplitSpec) -> Option<u64> {
        if split_spec.dimensionality() != self.dims.len() {
            return None;
        }
        let mut index = 0;
        let mut refining = true;
        for (&splits, &dim) in std::iter::zip(split_spec.iter(), &self.dims).rev() {
            if splits > dim {
                return None;
            }
            if refining {
                index += splits - 1;
                refining = splits == dim;
            } else if splits != 1 {
                return None;
            }
        }
        Some(index)
    }

    /// The average number of elements in a block produced by `splits`.
    ///
    /// Equal to the product of `dims[i] / splits[i]` with real division.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn block_cells_for_splits(&self, splits: &[u64]) -> f64 {
        std::iter::zip(&self.dims, splits)
            .map(|(&dim, &splits)| dim as f64 / splits as f64)
            .product()
    }
}

impl IndexedSequence for BlockSizeSequence {
    /// The number of split specs on the refinement path, `sum(dims[i] - 1) + 1`.
    fn len(&self) -> u64 {
        self.dims
            .iter()
            .map(|dim| dim.saturating_sub(1))
            .sum::<u64>()
            + 1
    }

    fn get(&self, index: u64) -> Option<f64> {
        (index < self.len())
            .then(|| self.block_cells_for_splits(&self.index_to_split_spec(index)))
    }
}

/// A [`BlockSizeSequence`] in reverse order, from the finest to the coarsest split spec.
///
/// The values of this sequence are non-decreasing.
#[derive(Copy, Clone, Debug)]
pub struct ReversedBlockSizeSequence<'a> {
    sequence: &'a BlockSizeSequence,
}

impl ReversedBlockSizeSequence<'_> {
    /// Convert a reversed index to the corresponding index of the forward sequence.
    ///
    /// Returns [`None`] if `index` is out-of-bounds.
    #[must_use]
    pub fn forward_index(&self, index: u64) -> Option<u64> {
        let len = self.sequence.len();
        (index < len).then(|| len - (index + 1))
    }

    /// Convert a reversed index to a split spec.
    ///
    /// Returns [`None`] if `index` is out-of-bounds.
    #[must_use]
    pub fn index_to_split_spec(&self, index: u64) -> Option<SplitSpec> {
        self.forward_index(index)
            .map(|index| self.sequence.index_to_split_spec(index))
    }
}

impl IndexedSequence for ReversedBlockSizeSequence<'_> {
    fn len(&self) -> u64 {
        self.sequence.len()
    }

    fn get(&self, index: u64) -> Option<f64> {
        self.forward_index(index)
            .and_then(|index| self.sequence.get(index))
    }
}
