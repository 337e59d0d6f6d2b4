//! `imgblocks` divides a series of N-dimensional images into roughly equally sized, non-overlapping blocks for parallel processing, and stacks processed blocks back along the time axis.
//!
//! The full array of a series of images has the time axis first, followed by the image axes.
//! Each image is blocked identically, and a block of one time point is keyed by a [`BlockKey`] locating it in the full array.
//! The blocks of one spatial location across every time point are then combined into a single block spanning the whole time axis.
//!
//! ## Getting Started
//! - Create a [`SimpleBlockingStrategy`] from the number of splits along each image axis, or from a requested block size in bytes with [`SimpleBlockingStrategy::from_block_size`].
//! - Bind it to the metadata of the images ([`ImagesMetadataSource`]) with [`SimpleBlockingStrategy::bind`].
//! - Extract and combine blocks with the [`BlockingStrategyTraits`] of the bound strategy, or drive the whole series in-process with [`BlockingStrategyTraits::blocks_from_images`].
//!
//! ## Example
//! ```rust
//! # use imgblocks::{ArrayMetadata, BlockingOptions, BlockingStrategyTraits, DataType, SimpleBlockingStrategy};
//! let metadata = ArrayMetadata::new(vec![12, 12], 2, DataType::UInt16);
//! let strategy = SimpleBlockingStrategy::new(vec![2, 2])?.bind(&metadata)?;
//!
//! let images = [ndarray::ArrayD::<u16>::zeros(vec![12, 12]), ndarray::ArrayD::<u16>::ones(vec![12, 12])];
//! let images = images.iter().map(|image| image.view()).collect::<Vec<_>>();
//! let blocks = strategy.blocks_from_images(&images, &BlockingOptions::default())?;
//! assert_eq!(blocks.len(), 4);
//! for (key, block) in &blocks {
//!     assert_eq!(key.spatial_shape(), vec![6, 6]);
//!     assert_eq!(block.shape(), &[2, 6, 6]);
//! }
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Logging
//! `imgblocks` logs information and warnings using the [`log`] crate.
//! A logging implementation must be enabled to capture logs.
//! See the [`log`] crate documentation for more details.
//!
//! ## Crate Features
//! `imgblocks` has no optional features.
//!
//! ## Licence
//! `imgblocks` is licensed under either of
//!  - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license <http://opensource.org/licenses/MIT>, at your option.

pub use imgblocks_grid as grid;

pub use grid::{ArrayIndices, ArrayShape, ArraySubset, AxisSlice, SplitSpec};

mod data_type;
pub use data_type::{DataType, UnsupportedDataTypeError};

mod element;
pub use element::{Element, ElementError};

mod metadata;
pub use metadata::{ArrayMetadata, ImagesMetadataSource};

mod block_key;
pub use block_key::{BlockKey, BlockKeyCreateError};

mod block_size;
pub use block_size::{BlockSize, BlockSizeParseError};

mod options;
pub use options::BlockingOptions;

pub mod strategy;
pub use strategy::{
    BlockingError, BlockingStrategy, BlockingStrategyCreateError, BlockingStrategyTraits,
    BlocksKind, BoundBlockingStrategy, BoundSimpleBlockingStrategy, SimpleBlockingStrategy,
};

use rayon_iter_concurrent_limit::iter_concurrent_limit;
