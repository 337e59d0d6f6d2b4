//! Slice grids.
//!
//! A [`SliceGrid`] is a [`SplitSpec`] bound to an array shape.
//! It holds the [`AxisSlice`]s of every axis, and the Cartesian product of those slices enumerates the blocks of the array.

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use thiserror::Error;

use crate::{
    partition_axis, unravel_index, ArrayIndices, ArrayShape, ArraySubset, AxisPartitionError,
    AxisSlice, IncompatibleDimensionalityError, SplitSpec, SplitSpecError,
};

/// A [`SliceGrid`] creation error.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SliceGridCreateError {
    /// The split spec is incompatible with the array shape.
    #[error(transparent)]
    SplitSpec(#[from] SplitSpecError),
    /// An axis could not be partitioned.
    #[error(transparent)]
    AxisPartition(#[from] AxisPartitionError),
}

/// The per-axis slices of a [`SplitSpec`] applied to an array shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SliceGrid {
    array_shape: ArrayShape,
    split_spec: SplitSpec,
    axes: Vec<Vec<AxisSlice>>,
}

impl SliceGrid {
    /// Create a new slice grid by partitioning each axis of `array_shape` into the number of slices given by `split_spec`.
    ///
    /// # Errors
    /// Returns a [`SliceGridCreateError`] if the `split_spec` does not match the dimensionality of `array_shape` or requests more splits than elements along an axis.
    pub fn new(
        array_shape: ArrayShape,
        split_spec: SplitSpec,
    ) -> Result<Self, SliceGridCreateError> {
        split_spec.validate_bounds(&array_shape)?;
        let axes = std::iter::zip(&array_shape, split_spec.iter())
            .map(|(&dim_size, &splits)| partition_axis(dim_size, splits))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            array_shape,
            split_spec,
            axes,
        })
    }

    /// The dimensionality of the grid.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.axes.len()
    }

    /// The array shape (i.e. number of elements).
    #[must_use]
    pub fn array_shape(&self) -> &[u64] {
        &self.array_shape
    }

    /// The split spec.
    #[must_use]
    pub fn split_spec(&self) -> &SplitSpec {
        &self.split_spec
    }

    /// The grid shape (i.e. number of blocks along each axis).
    #[must_use]
    pub fn grid_shape(&self) -> &[u64] {
        self.split_spec.as_slice()
    }

    /// The total number of blocks.
    #[must_use]
    pub fn num_blocks(&self) -> u64 {
        self.split_spec.num_blocks()
    }

    /// The slices of every axis.
    #[must_use]
    pub fn axes(&self) -> &[Vec<AxisSlice>] {
        &self.axes
    }

    /// The slices along `axis`.
    ///
    /// Returns [`None`] if `axis` is out-of-bounds.
    #[must_use]
    pub fn axis_slices(&self, axis: usize) -> Option<&[AxisSlice]> {
        self.axes.get(axis).map(Vec::as_slice)
    }

    /// The slices of the block at `block_indices`.
    ///
    /// Returns [`None`] if `block_indices` are out-of-bounds of the grid shape.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if `block_indices` do not match the dimensionality of the grid.
    pub fn block_slices(
        &self,
        block_indices: &[u64],
    ) -> Result<Option<Vec<AxisSlice>>, IncompatibleDimensionalityError> {
        if block_indices.len() != self.dimensionality() {
            return Err(IncompatibleDimensionalityError::new(
                block_indices.len(),
                self.dimensionality(),
            ));
        }
        Ok(std::iter::zip(block_indices, &self.axes)
            .map(|(&index, slices)| {
                usize::try_from(index)
                    .ok()
                    .and_then(|index| slices.get(index))
                    .copied()
            })
            .collect())
    }

    /// The [`ArraySubset`] of the block at `block_indices`.
    ///
    /// Returns [`None`] if `block_indices` are out-of-bounds of the grid shape.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if `block_indices` do not match the dimensionality of the grid.
    pub fn block_subset(
        &self,
        block_indices: &[u64],
    ) -> Result<Option<ArraySubset>, IncompatibleDimensionalityError> {
        Ok(self
            .block_slices(block_indices)?
            .map(|slices| ArraySubset::new_with_axis_slices(&slices)))
    }

    /// The indices of the block spanning exactly `slices`.
    ///
    /// Returns [`None`] if `slices` do not match the dimensionality of the grid or are not the slices of a block.
    #[must_use]
    pub fn block_indices_of(&self, slices: &[AxisSlice]) -> Option<ArrayIndices> {
        if slices.len() != self.dimensionality() {
            return None;
        }
        std::iter::zip(slices, &self.axes)
            .map(|(slice, axis_slices)| {
                let index = axis_slices
                    .binary_search_by_key(&slice.start(), AxisSlice::start)
                    .ok()?;
                (axis_slices[index] == *slice).then_some(index as u64)
            })
            .collect()
    }

    /// Return a serial iterator over the block indices and block slices of the grid.
    ///
    /// Blocks are visited in the order of the Cartesian product of the axis slices, with the last axis varying fastest.
    pub fn iter_blocks(&self) -> impl Iterator<Item = (ArrayIndices, Vec<AxisSlice>)> + '_ {
        (0..self.num_blocks()).map(move |index| self.block_at_linearised_index(index))
    }

    /// Return a parallel iterator over the block indices and block slices of the grid.
    pub fn par_iter_blocks(
        &self,
    ) -> impl ParallelIterator<Item = (ArrayIndices, Vec<AxisSlice>)> + '_ {
        (0..self.num_blocks())
            .into_par_iter()
            .map(move |index| self.block_at_linearised_index(index))
    }

    fn block_at_linearised_index(&self, index: u64) -> (ArrayIndices, Vec<AxisSlice>) {
        let block_indices =
            unravel_index(index, self.grid_shape()).expect("index is within the grid");
        let slices = std::iter::zip(&block_indices, &self.axes)
            .map(|(&i, slices)| slices[usize::try_from(i).unwrap()])
            .collect();
        (block_indices, slices)
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::*;

    fn slice_grid(array_shape: &[u64], splits: &[u64]) -> SliceGrid {
        SliceGrid::new(array_shape.to_vec(), splits.try_into().unwrap()).unwrap()
    }

    #[test]
    fn slice_grid_2d() {
        let grid = slice_grid(&[12, 12], &[2, 2]);
        assert_eq!(grid.dimensionality(), 2);
        assert_eq!(grid.grid_shape(), &[2, 2]);
        assert_eq!(grid.num_blocks(), 4);
        let blocks = grid.iter_blocks().collect_vec();
        assert_eq!(blocks.len(), 4);
        assert_eq!(
            blocks.iter().map(|(indices, _)| indices.clone()).collect_vec(),
            vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]]
        );
        for (indices, slices) in &blocks {
            assert_eq!(slices.iter().map(AxisSlice::len).collect_vec(), vec![6, 6]);
            assert_eq!(grid.block_indices_of(slices).as_ref(), Some(indices));
        }
        assert_eq!(
            blocks[1].1,
            vec![AxisSlice::from(0..6), AxisSlice::from(6..12)]
        );
    }

    #[test]
    fn slice_grid_uneven() {
        let grid = slice_grid(&[10, 5, 3], &[3, 2, 1]);
        assert_eq!(grid.num_blocks(), 6);
        assert_eq!(
            grid.axis_slices(0).unwrap(),
            &[
                AxisSlice::from(0..4),
                AxisSlice::from(4..7),
                AxisSlice::from(7..10)
            ]
        );
        assert_eq!(
            grid.axis_slices(1).unwrap(),
            &[AxisSlice::from(0..3), AxisSlice::from(3..5)]
        );
        assert!(grid.axis_slices(3).is_none());
        assert_eq!(
            grid.block_subset(&[2, 1, 0]).unwrap(),
            Some(ArraySubset::new_with_ranges(&[7..10, 3..5, 0..3]))
        );
        assert_eq!(grid.block_subset(&[3, 0, 0]).unwrap(), None);
        assert!(grid.block_subset(&[0, 0]).is_err());

        // the blocks tile the array
        let total: u64 = grid
            .iter_blocks()
            .map(|(_, slices)| slices.iter().map(AxisSlice::len).product::<u64>())
            .sum();
        assert_eq!(total, 10 * 5 * 3);
    }

    #[test]
    fn slice_grid_block_indices_of() {
        let grid = slice_grid(&[10, 4], &[3, 2]);
        assert_eq!(
            grid.block_indices_of(&[AxisSlice::from(4..7), AxisSlice::from(2..4)]),
            Some(vec![1, 1])
        );
        // start matches a block but end does not
        assert_eq!(
            grid.block_indices_of(&[AxisSlice::from(4..6), AxisSlice::from(2..4)]),
            None
        );
        assert_eq!(
            grid.block_indices_of(&[AxisSlice::from(5..7), AxisSlice::from(2..4)]),
            None
        );
        assert_eq!(grid.block_indices_of(&[AxisSlice::from(4..7)]), None);
    }

    #[test]
    fn slice_grid_par_iter() {
        let grid = slice_grid(&[7, 9, 4], &[3, 4, 2]);
        let mut par_blocks: Vec<_> = grid.par_iter_blocks().collect();
        par_blocks.sort();
        assert_eq!(par_blocks, grid.iter_blocks().collect_vec());
    }

    #[test]
    fn slice_grid_invalid() {
        assert!(matches!(
            SliceGrid::new(vec![12, 12], SplitSpec::try_from([2u64]).unwrap()),
            Err(SliceGridCreateError::SplitSpec(
                SplitSpecError::DimensionMismatch { .. }
            ))
        ));
        assert!(matches!(
            SliceGrid::new(vec![12, 2], SplitSpec::try_from([2u64, 3]).unwrap()),
            Err(SliceGridCreateError::SplitSpec(
                SplitSpecError::SplitsExceedDimension {
                    axis: 1,
                    splits: 3,
                    dim: 2
                }
            ))
        ));
    }
}
