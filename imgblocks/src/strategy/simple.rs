//! The simple blocking strategy.
//!
//! Each image axis is split into a fixed number of contiguous slices ([`partition_axis`](crate::grid::partition_axis)).
//! Every time point is blocked identically, and the blocks of one spatial location across all time points are stacked back along the time axis.

use ndarray::{ArrayD, ArrayViewD, Axis, Slice};
use serde::{Deserialize, Serialize};

use crate::{
    ArrayIndices, ArrayMetadata, AxisSlice, BlockKey, BlockSize, BlockingError,
    BlockingStrategyCreateError, BlockingStrategyTraits, BlocksKind, DataType, Element,
    ImagesMetadataSource,
    block_size::HumanBytes,
    grid::{
        BlockSizeSequence, IndexedSequence, SliceGrid, SplitSpec, SplitSpecError, bisect_left,
    },
};

/// A blocking strategy with a fixed number of splits along each image axis.
///
/// A [`SimpleBlockingStrategy`] must be bound to the metadata of a series of images with [`bind`](SimpleBlockingStrategy::bind) before blocks can be extracted or combined.
///
/// ### Example configuration
/// ```json
/// {
///     "splits_per_dim": [2, 2]
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimpleBlockingStrategy {
    splits_per_dim: SplitSpec,
}

impl SimpleBlockingStrategy {
    /// Create a new simple blocking strategy with `splits_per_dim` splits along each image axis.
    ///
    /// The upper bound of each split (the size of the image axis) is checked on [`bind`](SimpleBlockingStrategy::bind).
    ///
    /// # Errors
    /// Returns a [`SplitSpecError`] if any element of `splits_per_dim` is zero.
    pub fn new(splits_per_dim: Vec<u64>) -> Result<Self, SplitSpecError> {
        Ok(Self::from_split_spec(SplitSpec::new(splits_per_dim)?))
    }

    /// Create a new simple blocking strategy from a split spec.
    #[must_use]
    pub fn from_split_spec(splits_per_dim: SplitSpec) -> Self {
        Self { splits_per_dim }
    }

    /// Create a simple blocking strategy with blocks close to `block_size` bytes.
    ///
    /// A block holds every time point of a spatial region, so its size in bytes is the number of elements in the spatial region multiplied by `time_count` and the size of `data_type`.
    /// The split spec is searched along the refinement path of [`BlockSizeSequence`]: the finest split spec along the path with an average block size of at least `block_size`.
    /// If `block_size` exceeds the size of the whole array, the strategy has a single block.
    ///
    /// # Errors
    /// Returns a [`BlockingStrategyCreateError`] if `time_count` is zero or `dims` has a zero-sized dimension.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_block_size(
        block_size: impl Into<BlockSize>,
        dims: &[u64],
        time_count: u64,
        data_type: DataType,
    ) -> Result<Self, BlockingStrategyCreateError> {
        validate_images(dims, time_count)?;
        let block_size = block_size.into();

        let metadata = ArrayMetadata::new(dims.to_vec(), time_count, data_type);
        let target_cells = block_size.get() as f64 / metadata.series_size() as f64;

        let sequence = BlockSizeSequence::new(dims.to_vec());
        let reversed = sequence.reversed();
        let mut index = bisect_left(&reversed, target_cells);
        if index == reversed.len() {
            log::warn!(
                "requested block size {} exceeds the size of the whole array {dims:?} over {time_count} time points, using a single block",
                HumanBytes(block_size.get())
            );
            index = reversed.len() - 1;
        }
        let split_spec = sequence.index_to_split_spec(sequence.len() - 1 - index);
        log::debug!(
            "block size {} ({target_cells} elements per time point) selected splits {split_spec} for array {dims:?}",
            HumanBytes(block_size.get())
        );
        Ok(Self::from_split_spec(split_spec))
    }

    /// Create a simple blocking strategy with blocks close to `block_size`, parsed from a string such as `"256k"` or `"150M"`.
    ///
    /// See [`from_block_size`](SimpleBlockingStrategy::from_block_size).
    ///
    /// # Errors
    /// Returns a [`BlockingStrategyCreateError`] if `block_size` cannot be parsed or [`from_block_size`](SimpleBlockingStrategy::from_block_size) fails.
    pub fn from_block_size_str(
        block_size: &str,
        dims: &[u64],
        time_count: u64,
        data_type: DataType,
    ) -> Result<Self, BlockingStrategyCreateError> {
        Self::from_block_size(block_size.parse::<BlockSize>()?, dims, time_count, data_type)
    }

    /// Create a simple blocking strategy with blocks close to `block_size` for the images of `source`, and bind it to `source`.
    ///
    /// # Errors
    /// Returns a [`BlockingStrategyCreateError`] if the strategy cannot be created or bound.
    pub fn for_images_from_block_size<S: ImagesMetadataSource + ?Sized>(
        source: &S,
        block_size: impl Into<BlockSize>,
    ) -> Result<BoundSimpleBlockingStrategy, BlockingStrategyCreateError> {
        Self::from_block_size(
            block_size,
            source.dims(),
            source.time_count(),
            source.data_type(),
        )?
        .bind(source)
    }

    /// The number of splits along each image axis.
    #[must_use]
    pub fn splits_per_dim(&self) -> &SplitSpec {
        &self.splits_per_dim
    }

    /// The kind of container that should hold the combined blocks.
    #[must_use]
    pub fn blocks_kind(&self) -> BlocksKind {
        BlocksKind::SimpleBlocks
    }

    /// Bind the strategy to the metadata of a series of images.
    ///
    /// The slices of every block are computed once here.
    ///
    /// # Errors
    /// Returns a [`BlockingStrategyCreateError`] if the images are empty, or the split spec does not match the image dimensionality or exceeds an image axis.
    pub fn bind<S: ImagesMetadataSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<BoundSimpleBlockingStrategy, BlockingStrategyCreateError> {
        let metadata = ArrayMetadata::from_source(source);
        validate_images(metadata.dims(), metadata.time_count())?;
        let slice_grid = SliceGrid::new(metadata.dims().to_vec(), self.splits_per_dim.clone())?;
        log::debug!(
            "bound splits {} to images {:?} over {} time points: {} blocks",
            self.splits_per_dim,
            metadata.dims(),
            metadata.time_count(),
            slice_grid.num_blocks()
        );
        Ok(BoundSimpleBlockingStrategy {
            strategy: self.clone(),
            metadata,
            slice_grid,
        })
    }
}

fn validate_images(dims: &[u64], time_count: u64) -> Result<(), BlockingStrategyCreateError> {
    if time_count == 0 {
        Err(BlockingStrategyCreateError::ZeroTimeCount)
    } else if dims.contains(&0) {
        Err(BlockingStrategyCreateError::ZeroDimension(dims.to_vec()))
    } else {
        Ok(())
    }
}

/// A [`SimpleBlockingStrategy`] bound to the metadata of a series of images.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundSimpleBlockingStrategy {
    strategy: SimpleBlockingStrategy,
    metadata: ArrayMetadata,
    slice_grid: SliceGrid,
}

impl BoundSimpleBlockingStrategy {
    /// The unbound strategy.
    #[must_use]
    pub fn strategy(&self) -> &SimpleBlockingStrategy {
        &self.strategy
    }

    /// The slices of every spatial block.
    #[must_use]
    pub fn slice_grid(&self) -> &SliceGrid {
        &self.slice_grid
    }

    /// Bind the strategy to the metadata of another series of images.
    ///
    /// # Errors
    /// See [`SimpleBlockingStrategy::bind`].
    pub fn rebind<S: ImagesMetadataSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<Self, BlockingStrategyCreateError> {
        self.strategy.bind(source)
    }

    fn validate_image<T: Element>(
        &self,
        time_index: u64,
        image: &ArrayViewD<'_, T>,
    ) -> Result<(), BlockingError> {
        T::validate_data_type(self.metadata.data_type())?;
        if !std::iter::zip(image.shape(), self.metadata.dims()).all(|(&a, &b)| a as u64 == b)
            || image.ndim() != self.metadata.dimensionality()
        {
            return Err(BlockingError::IncompatibleImageShape {
                got: image.shape().iter().map(|&s| s as u64).collect(),
                expected: self.metadata.dims().to_vec(),
            });
        }
        if time_index >= self.metadata.time_count() {
            return Err(BlockingError::TimeIndexOutOfRange {
                time_index,
                time_count: self.metadata.time_count(),
            });
        }
        Ok(())
    }
}

impl BlockingStrategyTraits for BoundSimpleBlockingStrategy {
    fn metadata(&self) -> &ArrayMetadata {
        &self.metadata
    }

    fn blocks_kind(&self) -> BlocksKind {
        self.strategy.blocks_kind()
    }

    fn num_blocks(&self) -> u64 {
        self.slice_grid.num_blocks()
    }

    fn spatial_index(&self, key: &BlockKey) -> Option<ArrayIndices> {
        if key.original_shape() != self.metadata.array_shape().as_slice() {
            return None;
        }
        self.slice_grid.block_indices_of(key.spatial_slices())
    }

    fn extract_blocks<T: Element>(
        &self,
        time_index: u64,
        image: &ArrayViewD<'_, T>,
    ) -> Result<Vec<(BlockKey, ArrayD<T>)>, BlockingError> {
        self.validate_image(time_index, image)?;
        let original_shape = self.metadata.array_shape();
        Ok(self
            .slice_grid
            .iter_blocks()
            .map(|(_, slices)| {
                let block = image
                    .slice_each_axis(|axis| {
                        Slice::from(slices[axis.axis.index()].to_range_usize())
                    })
                    .insert_axis(Axis(0))
                    .to_owned();
                let original_slices = std::iter::once(AxisSlice::singleton(time_index))
                    .chain(slices)
                    .collect();
                (
                    BlockKey::new_unchecked(original_shape.clone(), original_slices),
                    block,
                )
            })
            .collect())
    }

    /// Combine the blocks of one spatial location across time.
    ///
    /// The spatial block is located by the first key, and every other key must locate the same block.
    ///
    /// # Panics
    /// Panics if the shape of the combined block exceeds [`usize::MAX`].
    fn combine_blocks<T: Element>(
        &self,
        spatial_index: &[u64],
        blocks: Vec<(BlockKey, ArrayD<T>)>,
    ) -> Result<(BlockKey, ArrayD<T>), BlockingError> {
        T::validate_data_type(self.metadata.data_type())?;
        let Some((first_key, _)) = blocks.first() else {
            return Err(BlockingError::EmptySpatialGroup(spatial_index.to_vec()));
        };
        let Some(group_index) = self.spatial_index(first_key) else {
            return Err(BlockingError::UnknownBlockKey(first_key.clone()));
        };
        let combined_key = first_key.with_full_time_slice();
        let mut combined =
            ArrayD::from_elem(combined_key.subset().shape_usize(), T::default());

        let num_blocks = blocks.len();
        let mut writes = vec![0usize; combined.len_of(Axis(0))];
        for (key, block) in blocks {
            match self.spatial_index(&key) {
                None => return Err(BlockingError::UnknownBlockKey(key)),
                Some(index) if index != group_index => {
                    return Err(BlockingError::InconsistentBlockKey {
                        key,
                        spatial_index: group_index,
                    });
                }
                Some(_) => {}
            }
            let expected = key.block_shape();
            if !std::iter::zip(block.shape(), &expected).all(|(&a, &b)| a as u64 == b)
                || block.ndim() != expected.len()
            {
                return Err(BlockingError::BlockShapeMismatch {
                    got: block.shape().iter().map(|&s| s as u64).collect(),
                    expected,
                    key,
                });
            }
            let time_range = key.time_slice().to_range_usize();
            combined
                .slice_axis_mut(Axis(0), Slice::from(time_range.clone()))
                .assign(&block);
            for count in &mut writes[time_range] {
                *count += 1;
            }
        }

        let missing: Vec<usize> = (0..writes.len()).filter(|&t| writes[t] == 0).collect();
        let duplicate: Vec<usize> = (0..writes.len()).filter(|&t| writes[t] > 1).collect();
        if !missing.is_empty() || !duplicate.is_empty() {
            log::warn!(
                "spatial block {spatial_index:?} combined {num_blocks} blocks over {} time points: missing time points {missing:?}, duplicate time points {duplicate:?}",
                self.metadata.time_count()
            );
        }
        Ok((combined_key, combined))
    }
}

#[cfg(test)]
mod tests {
    use ndarray::Array3;

    use super::*;

    fn metadata() -> ArrayMetadata {
        ArrayMetadata::new(vec![12, 12], 3, DataType::UInt16)
    }

    fn image(time_index: u16) -> ArrayD<u16> {
        ArrayD::from_shape_fn(vec![12, 12], |index| {
            time_index * 1000 + u16::try_from(index[0] * 12 + index[1]).unwrap()
        })
    }

    #[test]
    fn simple_blocking_strategy_new() {
        let strategy = SimpleBlockingStrategy::new(vec![2, 2]).unwrap();
        assert_eq!(strategy.splits_per_dim().as_slice(), &[2, 2]);
        assert_eq!(strategy.blocks_kind(), BlocksKind::SimpleBlocks);
        assert_eq!(
            SimpleBlockingStrategy::new(vec![2, 0]),
            Err(SplitSpecError::NonPositiveSplit { axis: 1, splits: 0 })
        );
    }

    #[test]
    fn simple_blocking_strategy_bind() {
        let strategy = SimpleBlockingStrategy::new(vec![2, 2]).unwrap();
        let bound = strategy.bind(&metadata()).unwrap();
        assert_eq!(bound.metadata(), &metadata());
        assert_eq!(bound.num_blocks(), 4);
        assert_eq!(bound.strategy(), &strategy);
        assert_eq!(bound.blocks_kind(), BlocksKind::SimpleBlocks);

        let rebound = bound
            .rebind(&ArrayMetadata::new(vec![4, 5], 2, DataType::UInt16))
            .unwrap();
        assert_eq!(rebound.slice_grid().array_shape(), &[4, 5]);

        assert!(matches!(
            SimpleBlockingStrategy::new(vec![2, 2, 2])
                .unwrap()
                .bind(&metadata()),
            Err(BlockingStrategyCreateError::SliceGridCreateError(_))
        ));
        assert!(matches!(
            SimpleBlockingStrategy::new(vec![13, 2])
                .unwrap()
                .bind(&metadata()),
            Err(BlockingStrategyCreateError::SliceGridCreateError(_))
        ));
        assert_eq!(
            strategy.bind(&ArrayMetadata::new(vec![12, 12], 0, DataType::UInt16)),
            Err(BlockingStrategyCreateError::ZeroTimeCount)
        );
    }

    #[test]
    fn simple_blocking_strategy_extract() {
        let bound = SimpleBlockingStrategy::new(vec![2, 2])
            .unwrap()
            .bind(&metadata())
            .unwrap();
        let image = image(1);
        let blocks = bound.extract_blocks(1, &image.view()).unwrap();
        assert_eq!(blocks.len(), 4);
        for (key, block) in &blocks {
            assert_eq!(key.original_shape(), &[3, 12, 12]);
            assert_eq!(key.time_slice(), AxisSlice::singleton(1));
            assert_eq!(block.shape(), &[1, 6, 6]);
        }
        let (key, block) = &blocks[1];
        assert_eq!(
            key.spatial_slices(),
            &[AxisSlice::from(0..6), AxisSlice::from(6..12)]
        );
        assert_eq!(bound.spatial_index(key), Some(vec![0, 1]));
        let expected = ArrayD::from_shape_fn(vec![6, 6], |index| {
            image[&[index[0], index[1] + 6][..]]
        });
        assert_eq!(block.index_axis(Axis(0), 0), expected.view());
    }

    #[test]
    fn simple_blocking_strategy_extract_invalid() {
        let bound = SimpleBlockingStrategy::new(vec![2, 2])
            .unwrap()
            .bind(&metadata())
            .unwrap();
        assert!(matches!(
            bound.extract_blocks(3, &image(0).view()),
            Err(BlockingError::TimeIndexOutOfRange {
                time_index: 3,
                time_count: 3
            })
        ));
        let wrong_shape = ArrayD::<u16>::zeros(vec![12, 11]);
        assert!(matches!(
            bound.extract_blocks(0, &wrong_shape.view()),
            Err(BlockingError::IncompatibleImageShape { .. })
        ));
        let wrong_dimensionality = ArrayD::<u16>::zeros(vec![12, 12, 1]);
        assert!(matches!(
            bound.extract_blocks(0, &wrong_dimensionality.view()),
            Err(BlockingError::IncompatibleImageShape { .. })
        ));
        let wrong_type = ArrayD::<f32>::zeros(vec![12, 12]);
        assert!(matches!(
            bound.extract_blocks(0, &wrong_type.view()),
            Err(BlockingError::ElementError(_))
        ));
    }

    #[test]
    fn simple_blocking_strategy_combine() {
        let bound = SimpleBlockingStrategy::new(vec![2, 2])
            .unwrap()
            .bind(&metadata())
            .unwrap();
        let images = [image(0), image(1), image(2)];
        let mut group = Vec::new();
        for (time_index, image) in images.iter().enumerate().rev() {
            let blocks = bound
                .extract_blocks(time_index as u64, &image.view())
                .unwrap();
            group.push(blocks[3].clone());
        }
        let (key, combined) = bound.combine_blocks(&[1, 1], group).unwrap();
        assert_eq!(key.time_slice(), AxisSlice::from(0..3));
        assert_eq!(
            key.spatial_slices(),
            &[AxisSlice::from(6..12), AxisSlice::from(6..12)]
        );
        let expected = Array3::from_shape_fn((3, 6, 6), |(t, i, j)| {
            images[t][&[i + 6, j + 6][..]]
        });
        assert_eq!(combined, expected.into_dyn());
    }

    #[test]
    fn simple_blocking_strategy_combine_invalid() {
        let bound = SimpleBlockingStrategy::new(vec![2, 2])
            .unwrap()
            .bind(&metadata())
            .unwrap();
        assert_eq!(
            bound.combine_blocks::<u16>(&[0, 0], vec![]),
            Err(BlockingError::EmptySpatialGroup(vec![0, 0]))
        );

        let blocks = bound.extract_blocks(0, &image(0).view()).unwrap();
        assert_eq!(
            bound.combine_blocks(&[0, 0], vec![blocks[0].clone(), blocks[1].clone()]),
            Err(BlockingError::InconsistentBlockKey {
                key: blocks[1].0.clone(),
                spatial_index: vec![0, 0],
            })
        );

        let (key, _) = blocks[0].clone();
        assert!(matches!(
            bound.combine_blocks(
                &[0, 0],
                vec![(key, ArrayD::<u16>::zeros(vec![1, 5, 6]))]
            ),
            Err(BlockingError::BlockShapeMismatch { .. })
        ));

        let unknown = BlockKey::new(
            vec![3, 12, 12],
            vec![
                AxisSlice::singleton(0),
                AxisSlice::from(0..5),
                AxisSlice::from(0..6),
            ],
        )
        .unwrap();
        assert!(matches!(
            bound.combine_blocks(
                &[0, 0],
                vec![(unknown, ArrayD::<u16>::zeros(vec![1, 5, 6]))]
            ),
            Err(BlockingError::UnknownBlockKey(_))
        ));
    }

    #[test]
    fn simple_blocking_strategy_combine_missing_time_points() {
        testing_logger::setup();
        let bound = SimpleBlockingStrategy::new(vec![2, 2])
            .unwrap()
            .bind(&metadata())
            .unwrap();
        let blocks = bound.extract_blocks(2, &image(2).view()).unwrap();
        let (key, combined) = bound
            .combine_blocks(&[0, 0], vec![blocks[0].clone()])
            .unwrap();
        assert_eq!(key.time_slice(), AxisSlice::from(0..3));
        assert!(combined.index_axis(Axis(0), 0).iter().all(|&v| v == 0));
        assert_eq!(
            combined.index_axis(Axis(0), 2),
            blocks[0].1.index_axis(Axis(0), 0)
        );
        testing_logger::validate(|captured_logs| {
            let warnings: Vec<_> = captured_logs
                .iter()
                .filter(|log| log.level == log::Level::Warn)
                .collect();
            assert_eq!(warnings.len(), 1);
            assert_eq!(
                warnings[0].body,
                "spatial block [0, 0] combined 1 blocks over 3 time points: missing time points [0, 1], duplicate time points []"
            );
        });
    }

    #[test]
    fn simple_blocking_strategy_combine_duplicate_time_points() {
        testing_logger::setup();
        let bound = SimpleBlockingStrategy::new(vec![2, 2])
            .unwrap()
            .bind(&metadata())
            .unwrap();
        let t0 = bound.extract_blocks(0, &image(0).view()).unwrap();
        let t2 = bound.extract_blocks(2, &image(2).view()).unwrap();
        let group = vec![t0[3].clone(), t0[3].clone(), t2[3].clone()];
        let (_, combined) = bound.combine_blocks(&[1, 1], group).unwrap();
        assert!(combined.index_axis(Axis(0), 1).iter().all(|&v| v == 0));
        assert_eq!(
            combined.index_axis(Axis(0), 2),
            t2[3].1.index_axis(Axis(0), 0)
        );
        testing_logger::validate(|captured_logs| {
            let warnings: Vec<_> = captured_logs
                .iter()
                .filter(|log| log.level == log::Level::Warn)
                .collect();
            assert_eq!(warnings.len(), 1);
            assert_eq!(
                warnings[0].body,
                "spatial block [1, 1] combined 3 blocks over 3 time points: missing time points [1], duplicate time points [0]"
            );
        });
    }

    #[test]
    fn simple_blocking_strategy_combine_linear_group_token() {
        let bound = SimpleBlockingStrategy::new(vec![2, 2])
            .unwrap()
            .bind(&metadata())
            .unwrap();
        let group = (0..3u16)
            .map(|time_index| {
                bound
                    .extract_blocks(u64::from(time_index), &image(time_index).view())
                    .unwrap()
                    .swap_remove(3)
            })
            .collect::<Vec<_>>();
        let (key, combined) = bound.combine_blocks(&[3], group.clone()).unwrap();
        assert_eq!(
            bound.combine_blocks(&[1, 1], group).unwrap(),
            (key.clone(), combined)
        );
        assert_eq!(bound.spatial_index(&key), Some(vec![1, 1]));
    }
}
