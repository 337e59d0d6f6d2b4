//! Blocking strategies.
//!
//! A blocking strategy describes how each image of a series is divided into blocks, and how the blocks of one spatial location across every time point are combined.
//!
//! A strategy is created unbound ([`BlockingStrategy`]) and must be bound to the metadata of a series of images ([`BoundBlockingStrategy`]) before it can extract or combine blocks.
//! The bound metadata cannot change; binding to other images produces a new bound strategy.
//!
//! Extraction and combination are pure functions of their inputs and can be called concurrently.
//! Distributing them across workers is left to the caller, though [`BlockingStrategyTraits::blocks_from_images`] drives a whole series in-process with Rayon.

mod simple;
mod strategy_errors;

use std::collections::BTreeMap;

use ndarray::{ArrayD, ArrayViewD};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

pub use simple::{BoundSimpleBlockingStrategy, SimpleBlockingStrategy};
pub use strategy_errors::{BlockingError, BlockingStrategyCreateError};

use crate::{
    ArrayIndices, ArrayMetadata, BlockKey, BlockingOptions, Element, ImagesMetadataSource,
};

/// The kind of container that should hold combined blocks.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BlocksKind {
    /// Generic blocks.
    Blocks,
    /// Blocks of a [`SimpleBlockingStrategy`].
    SimpleBlocks,
}

/// Blocking strategy traits.
///
/// Implemented by strategies bound to the metadata of a series of images.
pub trait BlockingStrategyTraits: core::fmt::Debug + Send + Sync {
    /// The bound image metadata.
    fn metadata(&self) -> &ArrayMetadata;

    /// The kind of container that should hold the combined blocks.
    fn blocks_kind(&self) -> BlocksKind {
        BlocksKind::Blocks
    }

    /// The number of spatial blocks.
    fn num_blocks(&self) -> u64;

    /// The index of the spatial block located by `key`.
    ///
    /// Returns [`None`] if `key` does not locate a block of this strategy.
    fn spatial_index(&self, key: &BlockKey) -> Option<ArrayIndices>;

    /// Extract every block of the image at `time_index`.
    ///
    /// Each block has a leading time axis of length one.
    ///
    /// # Errors
    /// Returns a [`BlockingError`] if `T` does not match the bound data type, the image shape does not match the bound image shape, or `time_index` is out of range.
    fn extract_blocks<T: Element>(
        &self,
        time_index: u64,
        image: &ArrayViewD<'_, T>,
    ) -> Result<Vec<(BlockKey, ArrayD<T>)>, BlockingError>;

    /// Combine the blocks of one spatial block across time into one block spanning every time point.
    ///
    /// `spatial_index` is an opaque group token used only to identify the group in errors and logs, the spatial block is located by the keys of `blocks`.
    /// Blocks are placed by the time slice of their key and may be in any order.
    /// Time points without a block are filled with [`Default::default`], and a later block for the same time point overwrites an earlier one.
    ///
    /// # Errors
    /// Returns a [`BlockingError`] if `blocks` is empty, the keys do not all locate the same spatial block, or a block shape does not match its key.
    fn combine_blocks<T: Element>(
        &self,
        spatial_index: &[u64],
        blocks: Vec<(BlockKey, ArrayD<T>)>,
    ) -> Result<(BlockKey, ArrayD<T>), BlockingError>;

    /// Extract the blocks of every image and combine them per spatial block.
    ///
    /// `images` are ordered by time.
    /// Images are blocked in parallel and spatial blocks are combined in parallel, with concurrency limited by [`BlockingOptions::concurrent_target`].
    /// The combined blocks are ordered by spatial index (last axis fastest).
    ///
    /// # Errors
    /// Returns a [`BlockingError`] if the number of images does not match the bound time count, or extraction or combination fails.
    fn blocks_from_images<T: Element>(
        &self,
        images: &[ArrayViewD<'_, T>],
        options: &BlockingOptions,
    ) -> Result<Vec<(BlockKey, ArrayD<T>)>, BlockingError> {
        if images.len() as u64 != self.metadata().time_count() {
            return Err(BlockingError::ImageCountMismatch {
                images: images.len(),
                time_count: self.metadata().time_count(),
            });
        }

        let extracted = crate::iter_concurrent_limit!(
            options.concurrent_limit(),
            (0..images.len()),
            map,
            |time_index| self.extract_blocks(time_index as u64, &images[time_index])
        )
        .collect::<Result<Vec<_>, _>>()?;

        let mut groups: BTreeMap<ArrayIndices, Vec<(BlockKey, ArrayD<T>)>> = BTreeMap::new();
        for (key, block) in extracted.into_iter().flatten() {
            let Some(spatial_index) = self.spatial_index(&key) else {
                return Err(BlockingError::UnknownBlockKey(key));
            };
            groups.entry(spatial_index).or_default().push((key, block));
        }
        let groups: Vec<_> = groups.into_iter().collect();

        crate::iter_concurrent_limit!(
            options.concurrent_limit(),
            groups,
            map,
            |(spatial_index, blocks): (ArrayIndices, Vec<(BlockKey, ArrayD<T>)>)| {
                self.combine_blocks(&spatial_index, blocks)
            }
        )
        .collect()
    }
}

/// An unbound blocking strategy.
///
/// ### Example configuration
/// ```json
/// {
///     "name": "simple",
///     "configuration": {
///         "splits_per_dim": [2, 2]
///     }
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::From)]
#[serde(tag = "name", content = "configuration", rename_all = "lowercase")]
#[non_exhaustive]
pub enum BlockingStrategy {
    /// A simple blocking strategy.
    Simple(SimpleBlockingStrategy),
}

impl BlockingStrategy {
    /// The name of the strategy.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Simple(_) => "simple",
        }
    }

    /// The kind of container that should hold the combined blocks.
    #[must_use]
    pub fn blocks_kind(&self) -> BlocksKind {
        match self {
            Self::Simple(strategy) => strategy.blocks_kind(),
        }
    }

    /// Bind the strategy to the metadata of a series of images.
    ///
    /// # Errors
    /// Returns a [`BlockingStrategyCreateError`] if the strategy is incompatible with the images.
    pub fn bind<S: ImagesMetadataSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<BoundBlockingStrategy, BlockingStrategyCreateError> {
        match self {
            Self::Simple(strategy) => Ok(strategy.bind(source)?.into()),
        }
    }
}

/// A blocking strategy bound to the metadata of a series of images.
#[derive(Clone, Debug, PartialEq, Eq, derive_more::From)]
#[non_exhaustive]
pub enum BoundBlockingStrategy {
    /// A bound simple blocking strategy.
    Simple(BoundSimpleBlockingStrategy),
}

impl BoundBlockingStrategy {
    /// The unbound strategy.
    #[must_use]
    pub fn strategy(&self) -> BlockingStrategy {
        match self {
            Self::Simple(strategy) => strategy.strategy().clone().into(),
        }
    }
}

impl BlockingStrategyTraits for BoundBlockingStrategy {
    fn metadata(&self) -> &ArrayMetadata {
        match self {
            Self::Simple(strategy) => strategy.metadata(),
        }
    }

    fn blocks_kind(&self) -> BlocksKind {
        match self {
            Self::Simple(strategy) => strategy.blocks_kind(),
        }
    }

    fn num_blocks(&self) -> u64 {
        match self {
            Self::Simple(strategy) => strategy.num_blocks(),
        }
    }

    fn spatial_index(&self, key: &BlockKey) -> Option<ArrayIndices> {
        match self {
            Self::Simple(strategy) => strategy.spatial_index(key),
        }
    }

    fn extract_blocks<T: Element>(
        &self,
        time_index: u64,
        image: &ArrayViewD<'_, T>,
    ) -> Result<Vec<(BlockKey, ArrayD<T>)>, BlockingError> {
        match self {
            Self::Simple(strategy) => strategy.extract_blocks(time_index, image),
        }
    }

    fn combine_blocks<T: Element>(
        &self,
        spatial_index: &[u64],
        blocks: Vec<(BlockKey, ArrayD<T>)>,
    ) -> Result<(BlockKey, ArrayD<T>), BlockingError> {
        match self {
            Self::Simple(strategy) => strategy.combine_blocks(spatial_index, blocks),
        }
    }
}
