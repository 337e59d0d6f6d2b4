//! Block keys.

use std::fmt::Display;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ArrayShape, ArraySubset, AxisSlice};

/// A [`BlockKey`] creation error.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BlockKeyCreateError {
    /// The number of slices does not match the dimensionality of the original shape.
    #[error("{slices} slices do not match original shape {original_shape:?}")]
    IncompatibleDimensionality {
        /// The number of slices.
        slices: usize,
        /// The original shape.
        original_shape: ArrayShape,
    },
    /// The original shape has no time axis.
    #[error("the original shape must include a time axis")]
    MissingTimeAxis,
    /// A slice extends beyond the original shape.
    #[error("slice {slice} on axis {axis} is out of bounds of original shape {original_shape:?}")]
    OutOfBounds {
        /// The axis.
        axis: usize,
        /// The slice.
        slice: AxisSlice,
        /// The original shape.
        original_shape: ArrayShape,
    },
}

/// Locates a block within the full array of a series of images.
///
/// The full array has the time axis first, followed by the image axes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "BlockKeyMetadata")]
pub struct BlockKey {
    original_shape: ArrayShape,
    original_slices: Vec<AxisSlice>,
}

#[derive(Deserialize)]
struct BlockKeyMetadata {
    original_shape: ArrayShape,
    original_slices: Vec<AxisSlice>,
}

impl TryFrom<BlockKeyMetadata> for BlockKey {
    type Error = BlockKeyCreateError;

    fn try_from(metadata: BlockKeyMetadata) -> Result<Self, Self::Error> {
        Self::new(metadata.original_shape, metadata.original_slices)
    }
}

impl Display for BlockKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] of {:?}",
            self.original_slices.iter().join(", "),
            self.original_shape
        )
    }
}

impl BlockKey {
    /// Create a new block key.
    ///
    /// # Errors
    /// Returns a [`BlockKeyCreateError`] if `original_shape` is empty, or `original_slices` do not match or exceed `original_shape`.
    pub fn new(
        original_shape: ArrayShape,
        original_slices: Vec<AxisSlice>,
    ) -> Result<Self, BlockKeyCreateError> {
        if original_shape.is_empty() {
            return Err(BlockKeyCreateError::MissingTimeAxis);
        }
        if original_slices.len() != original_shape.len() {
            return Err(BlockKeyCreateError::IncompatibleDimensionality {
                slices: original_slices.len(),
                original_shape,
            });
        }
        if let Some((axis, slice)) = std::iter::zip(&original_slices, &original_shape)
            .enumerate()
            .find(|(_, (slice, dim))| slice.end() > **dim)
            .map(|(axis, (slice, _))| (axis, *slice))
        {
            return Err(BlockKeyCreateError::OutOfBounds {
                axis,
                slice,
                original_shape,
            });
        }
        Ok(Self::new_unchecked(original_shape, original_slices))
    }

    pub(crate) fn new_unchecked(
        original_shape: ArrayShape,
        original_slices: Vec<AxisSlice>,
    ) -> Self {
        debug_assert_eq!(original_shape.len(), original_slices.len());
        Self {
            original_shape,
            original_slices,
        }
    }

    /// The shape of the full array, with the time axis first.
    #[must_use]
    pub fn original_shape(&self) -> &[u64] {
        &self.original_shape
    }

    /// The slices locating the block in the full array, with the time axis first.
    #[must_use]
    pub fn original_slices(&self) -> &[AxisSlice] {
        &self.original_slices
    }

    /// The number of time points of the full array.
    #[must_use]
    pub fn time_count(&self) -> u64 {
        self.original_shape[0]
    }

    /// The slice of the block along the time axis.
    #[must_use]
    pub fn time_slice(&self) -> AxisSlice {
        self.original_slices[0]
    }

    /// The slices of the block along the image axes.
    #[must_use]
    pub fn spatial_slices(&self) -> &[AxisSlice] {
        &self.original_slices[1..]
    }

    /// The shape of the block along the image axes.
    #[must_use]
    pub fn spatial_shape(&self) -> ArrayShape {
        self.spatial_slices().iter().map(AxisSlice::len).collect()
    }

    /// The shape of the block, including the time axis.
    #[must_use]
    pub fn block_shape(&self) -> ArrayShape {
        self.original_slices.iter().map(AxisSlice::len).collect()
    }

    /// The region of the full array spanned by the block.
    #[must_use]
    pub fn subset(&self) -> ArraySubset {
        ArraySubset::new_with_axis_slices(&self.original_slices)
    }

    /// Return a copy of the key with the time slice spanning every time point.
    #[must_use]
    pub fn with_full_time_slice(&self) -> Self {
        let mut key = self.clone();
        key.original_slices[0] = AxisSlice::full(self.time_count());
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> BlockKey {
        BlockKey::new(
            vec![4, 12, 12],
            vec![
                AxisSlice::singleton(2),
                AxisSlice::from(0..6),
                AxisSlice::from(6..12),
            ],
        )
        .unwrap()
    }

    #[test]
    fn block_key() {
        let key = key();
        assert_eq!(key.original_shape(), &[4, 12, 12]);
        assert_eq!(key.time_count(), 4);
        assert_eq!(key.time_slice(), AxisSlice::from(2..3));
        assert_eq!(
            key.spatial_slices(),
            &[AxisSlice::from(0..6), AxisSlice::from(6..12)]
        );
        assert_eq!(key.spatial_shape(), vec![6, 6]);
        assert_eq!(key.block_shape(), vec![1, 6, 6]);
        assert_eq!(
            key.subset(),
            ArraySubset::new_with_ranges(&[2..3, 0..6, 6..12])
        );
        assert_eq!(key.to_string(), "[2..3, 0..6, 6..12] of [4, 12, 12]");

        let full = key.with_full_time_slice();
        assert_eq!(full.time_slice(), AxisSlice::from(0..4));
        assert_eq!(full.spatial_slices(), key.spatial_slices());
        assert_eq!(full.original_shape(), key.original_shape());
    }

    #[test]
    fn block_key_invalid() {
        assert_eq!(
            BlockKey::new(vec![], vec![]),
            Err(BlockKeyCreateError::MissingTimeAxis)
        );
        assert!(matches!(
            BlockKey::new(vec![4, 12], vec![AxisSlice::singleton(0)]),
            Err(BlockKeyCreateError::IncompatibleDimensionality { slices: 1, .. })
        ));
        assert!(matches!(
            BlockKey::new(
                vec![4, 12],
                vec![AxisSlice::singleton(4), AxisSlice::from(0..12)]
            ),
            Err(BlockKeyCreateError::OutOfBounds { axis: 0, .. })
        ));
    }

    #[test]
    fn block_key_serde() {
        let key = key();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(
            json,
            r#"{"original_shape":[4,12,12],"original_slices":[{"start":2,"end":3},{"start":0,"end":6},{"start":6,"end":12}]}"#
        );
        assert_eq!(serde_json::from_str::<BlockKey>(&json).unwrap(), key);

        assert!(serde_json::from_str::<BlockKey>(
            r#"{"original_shape":[4,12],"original_slices":[{"start":4,"end":5},{"start":0,"end":6}]}"#
        )
        .is_err());
    }
}
