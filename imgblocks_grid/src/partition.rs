//! Balanced partitioning of a single axis.

use thiserror::Error;

use crate::AxisSlice;

/// An axis partitioning error.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum AxisPartitionError {
    /// Zero splits were requested.
    #[error("the number of splits must be positive")]
    ZeroSplits,
    /// More splits were requested than there are elements along the axis.
    #[error("{splits} splits exceed the axis size {dim_size}")]
    SplitsExceedDimension {
        /// The requested number of splits.
        splits: u64,
        /// The size of the axis.
        dim_size: u64,
    },
}

/// Partition an axis of size `dim_size` into `splits` contiguous, non-overlapping slices.
///
/// The slices cover `0..dim_size` exactly and their lengths differ by at most one.
/// The remainder of `dim_size / splits` is distributed to the earliest slices, so an axis of size 10 split 3 ways yields `[0..4, 4..7, 7..10]`.
///
/// # Errors
/// Returns an [`AxisPartitionError`] if `splits` is zero or exceeds `dim_size`.
pub fn partition_axis(dim_size: u64, splits: u64) -> Result<Vec<AxisSlice>, AxisPartitionError> {
    if splits == 0 {
        return Err(AxisPartitionError::ZeroSplits);
    }
    if splits > dim_size {
        return Err(AxisPartitionError::SplitsExceedDimension { splits, dim_size });
    }

    let base = dim_size / splits;
    let remainder = dim_size % splits;
    Ok((0..splits)
        .scan(0, |start, split| {
            let len = if split < remainder { base + 1 } else { base };
            let slice = AxisSlice::new(*start, *start + len);
            *start += len;
            Some(slice)
        })
        .collect())
}
