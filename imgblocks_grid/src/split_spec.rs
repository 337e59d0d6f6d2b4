//! Split specifications.

use std::fmt::Display;

use derive_more::Deref;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A split specification error.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SplitSpecError {
    /// A non-positive number of splits.
    #[error("all numbers of splits must be positive; got {splits} on axis {axis}")]
    NonPositiveSplit {
        /// The axis.
        axis: usize,
        /// The number of splits.
        splits: u64,
    },
    /// The split spec dimensionality does not match the array dimensionality.
    #[error("split spec length ({}) must match array dimensionality ({}); have split spec {splits:?} and array shape {dims:?}", splits.len(), dims.len())]
    DimensionMismatch {
        /// The splits per dimension.
        splits: Vec<u64>,
        /// The array shape.
        dims: Vec<u64>,
    },
    /// More splits than elements along an axis.
    #[error("{splits} splits on axis {axis} exceed the axis size {dim}")]
    SplitsExceedDimension {
        /// The axis.
        axis: usize,
        /// The number of splits.
        splits: u64,
        /// The size of the axis.
        dim: u64,
    },
}

/// The number of partitions along each dimension of an array.
///
/// Every element is positive.
/// The upper bound of each element (the size of the corresponding array dimension) is only known once a [`SplitSpec`] is paired with an array shape, see [`SplitSpec::validate_bounds`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deref, Serialize, Deserialize)]
#[serde(try_from = "Vec<u64>", into = "Vec<u64>")]
pub struct SplitSpec(Vec<u64>);

impl TryFrom<Vec<u64>> for SplitSpec {
    type Error = SplitSpecError;

    fn try_from(splits: Vec<u64>) -> Result<Self, Self::Error> {
        Self::new(splits)
    }
}

impl TryFrom<&[u64]> for SplitSpec {
    type Error = SplitSpecError;

    fn try_from(splits: &[u64]) -> Result<Self, Self::Error> {
        Self::new(splits.to_vec())
    }
}

impl<const N: usize> TryFrom<[u64; N]> for SplitSpec {
    type Error = SplitSpecError;

    fn try_from(splits: [u64; N]) -> Result<Self, Self::Error> {
        Self::new(splits.to_vec())
    }
}

impl From<SplitSpec> for Vec<u64> {
    fn from(split_spec: SplitSpec) -> Self {
        split_spec.0
    }
}

impl Display for SplitSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl SplitSpec {
    /// Create a new split spec.
    ///
    /// # Errors
    /// Returns [`SplitSpecError::NonPositiveSplit`] if any element of `splits` is zero.
    pub fn new(splits: Vec<u64>) -> Result<Self, SplitSpecError> {
        if let Some(axis) = splits.iter().position(|&s| s == 0) {
            Err(SplitSpecError::NonPositiveSplit { axis, splits: 0 })
        } else {
            Ok(Self(splits))
        }
    }

    /// Create a split spec with a single partition along each of `dimensionality` dimensions.
    #[must_use]
    pub fn ones(dimensionality: usize) -> Self {
        Self(vec![1; dimensionality])
    }

    /// Create a split spec without checking that every element is positive.
    pub(crate) fn new_unchecked(splits: Vec<u64>) -> Self {
        debug_assert!(splits.iter().all(|&s| s > 0));
        Self(splits)
    }

    /// Return the splits as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }

    /// Return the dimensionality of the split spec.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.0.len()
    }

    /// Return the number of blocks produced by the split spec.
    ///
    /// Equal to the product of its elements.
    #[must_use]
    pub fn num_blocks(&self) -> u64 {
        self.0.iter().product()
    }

    /// Validate the split spec against the dimensionality of an array with shape `dims`.
    ///
    /// The elements of the split spec are not checked against `dims`, see [`validate_bounds`](Self::validate_bounds).
    ///
    /// # Errors
    /// Returns [`SplitSpecError::DimensionMismatch`] if the length of the split spec does not match the length of `dims`.
    pub fn validate(&self, dims: &[u64]) -> Result<(), SplitSpecError> {
        if self.0.len() == dims.len() {
            Ok(())
        } else {
            Err(SplitSpecError::DimensionMismatch {
                splits: self.0.clone(),
                dims: dims.to_vec(),
            })
        }
    }

    /// Validate the split spec against an array with shape `dims`.
    ///
    /// # Errors
    /// Returns a [`SplitSpecError`] if the length of the split spec does not match the length of `dims` or any element exceeds the corresponding dimension size.
    pub fn validate_bounds(&self, dims: &[u64]) -> Result<(), SplitSpecError> {
        self.validate(dims)?;
        match std::iter::zip(&self.0, dims)
            .enumerate()
            .find(|(_, (splits, dim))| splits > dim)
        {
            Some((axis, (&splits, &dim))) => Err(SplitSpecError::SplitsExceedDimension {
                axis,
                splits,
                dim,
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_spec() {
        let split_spec = SplitSpec::try_from([2u64, 3]).unwrap();
        assert_eq!(split_spec.as_slice(), &[2, 3]);
        assert_eq!(split_spec.dimensionality(), 2);
        assert_eq!(split_spec.num_blocks(), 6);
        assert_eq!(split_spec.to_string(), "[2, 3]");
        assert_eq!(split_spec[1], 3);
        assert_eq!(SplitSpec::ones(3).as_slice(), &[1, 1, 1]);
    }

    #[test]
    fn split_spec_non_positive() {
        let err = SplitSpec::try_from([2u64, 0, 1]).unwrap_err();
        assert_eq!(err, SplitSpecError::NonPositiveSplit { axis: 1, splits: 0 });
        assert_eq!(
            err.to_string(),
            "all numbers of splits must be positive; got 0 on axis 1"
        );
    }

    #[test]
    fn split_spec_validate() {
        let split_spec = SplitSpec::try_from([2u64, 4]).unwrap();
        assert!(split_spec.validate(&[12, 12]).is_ok());
        // bounds are not checked by validate
        assert!(split_spec.validate(&[12, 3]).is_ok());

        let err = split_spec.validate(&[12, 12, 12]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "split spec length (2) must match array dimensionality (3); have split spec [2, 4] and array shape [12, 12, 12]"
        );

        assert_eq!(
            split_spec.validate_bounds(&[12, 3]),
            Err(SplitSpecError::SplitsExceedDimension {
                axis: 1,
                splits: 4,
                dim: 3
            })
        );
        assert!(split_spec.validate_bounds(&[2, 4]).is_ok());
        assert!(matches!(
            split_spec.validate_bounds(&[2]),
            Err(SplitSpecError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn split_spec_serde() {
        let split_spec: SplitSpec = serde_json::from_str("[1,2,3]").unwrap();
        assert_eq!(split_spec.as_slice(), &[1, 2, 3]);
        assert_eq!(serde_json::to_string(&split_spec).unwrap(), "[1,2,3]");
        assert!(serde_json::from_str::<SplitSpec>("[1,0,3]").is_err());
    }
}
