//! Block grid geometry for the [`imgblocks`](https://docs.rs/imgblocks/latest/imgblocks/index.html) crate.
//!
//! This crate computes how an N-dimensional image is carved into non-overlapping, roughly equally
//! sized blocks:
//!  - [`partition_axis`] splits one axis into contiguous [`AxisSlice`]s whose lengths differ by at most one,
//!  - [`SplitSpec`] is the number of splits requested along each axis,
//!  - [`SliceGrid`] holds the per-axis slices of a [`SplitSpec`] bound to an array shape, and
//!  - [`BlockSizeSequence`] orders split specs from coarsest to finest so that a split spec can be
//!    chosen from a requested block size with [`bisect_left`].
//!
//! ## Licence
//! `imgblocks_grid` is licensed under either of
//!  - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license <http://opensource.org/licenses/MIT>, at your option.

mod array_subset;
pub use array_subset::ArraySubset;

mod axis_slice;
pub use axis_slice::AxisSlice;

mod partition;
pub use partition::{partition_axis, AxisPartitionError};

mod split_spec;
pub use split_spec::{SplitSpec, SplitSpecError};

mod slice_grid;
pub use slice_grid::{SliceGrid, SliceGridCreateError};

mod block_size_sequence;
pub use block_size_sequence::{
    bisect_left, BlockSizeSequence, IndexedSequence, ReversedBlockSizeSequence,
};

/// The shape of an array.
pub type ArrayShape = Vec<u64>;

/// An ND index to an element in an array, or to a block in a [`SliceGrid`].
pub type ArrayIndices = Vec<u64>;

/// An incompatible dimensionality error.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("incompatible dimensionality {0}, expected {1}")]
pub struct IncompatibleDimensionalityError(usize, usize);

impl IncompatibleDimensionalityError {
    /// Create a new incompatible dimensionality error.
    #[must_use]
    pub const fn new(got: usize, expected: usize) -> Self {
        Self(got, expected)
    }
}

/// Unravel a linearised index to ND indices.
///
/// The last dimension varies fastest (i.e. C-contiguous order).
/// Returns [`None`] if `index` is out-of-bounds of `shape`.
#[must_use]
pub fn unravel_index(mut index: u64, shape: &[u64]) -> Option<ArrayIndices> {
    let total_size: u64 = shape
        .iter()
        .try_fold(1u64, |acc, &dim| acc.checked_mul(dim))?;
    if index >= total_size {
        return None;
    }
    let mut indices = vec![0; shape.len()];
    for (indices_i, &dim) in std::iter::zip(indices.iter_mut(), shape).rev() {
        *indices_i = index % dim;
        index /= dim;
    }
    Some(indices)
}
