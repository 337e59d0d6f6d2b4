//! Blocking strategy errors.

use thiserror::Error;

use crate::{
    ArrayIndices, ArrayShape, BlockKey, BlockSizeParseError, ElementError,
    grid::{SliceGridCreateError, SplitSpecError},
};

/// A blocking strategy creation error.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BlockingStrategyCreateError {
    /// An invalid split spec.
    #[error(transparent)]
    SplitSpecError(#[from] SplitSpecError),
    /// The split spec cannot be applied to the image shape.
    #[error(transparent)]
    SliceGridCreateError(#[from] SliceGridCreateError),
    /// An invalid block size.
    #[error(transparent)]
    BlockSizeParseError(#[from] BlockSizeParseError),
    /// There are no images.
    #[error("the number of images must be positive")]
    ZeroTimeCount,
    /// An image dimension has zero size.
    #[error("image shape {0:?} has a zero-sized dimension")]
    ZeroDimension(ArrayShape),
}

/// A block extraction or combination error.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BlockingError {
    /// The element type does not match the data type of the images.
    #[error(transparent)]
    ElementError(#[from] ElementError),
    /// The image shape does not match the bound image shape.
    #[error("image shape {got:?} does not match the bound image shape {expected:?}")]
    IncompatibleImageShape {
        /// The shape of the image.
        got: ArrayShape,
        /// The bound image shape.
        expected: ArrayShape,
    },
    /// The time index is beyond the number of images.
    #[error("time index {time_index} is out of range for {time_count} images")]
    TimeIndexOutOfRange {
        /// The time index.
        time_index: u64,
        /// The number of images.
        time_count: u64,
    },
    /// The number of images does not match the bound number of images.
    #[error("got {images} images, expected {time_count}")]
    ImageCountMismatch {
        /// The number of images.
        images: usize,
        /// The bound number of images.
        time_count: u64,
    },
    /// A spatial group has no blocks.
    #[error("spatial block {0:?} has no blocks to combine")]
    EmptySpatialGroup(ArrayIndices),
    /// A block key does not locate a block of the bound slice grid.
    #[error("block key {0} does not match the bound slice grid")]
    UnknownBlockKey(BlockKey),
    /// A block key locates a different spatial block.
    #[error("block key {key} does not belong to spatial block {spatial_index:?}")]
    InconsistentBlockKey {
        /// The block key.
        key: BlockKey,
        /// The expected spatial block.
        spatial_index: ArrayIndices,
    },
    /// The shape of a block does not match the shape described by its key.
    #[error("block with shape {got:?} does not match shape {expected:?} of block key {key}")]
    BlockShapeMismatch {
        /// The block key.
        key: BlockKey,
        /// The shape of the block.
        got: ArrayShape,
        /// The shape described by the key.
        expected: ArrayShape,
    },
}
