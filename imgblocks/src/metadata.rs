//! Image array metadata.

use serde::{Deserialize, Serialize};

use crate::{ArrayShape, DataType};

/// A source of the metadata of a series of images, such as an image container.
///
/// A blocking strategy reads the metadata once, when it is bound with [`SimpleBlockingStrategy::bind`](crate::strategy::SimpleBlockingStrategy::bind).
pub trait ImagesMetadataSource {
    /// The shape of each image.
    fn dims(&self) -> &[u64];

    /// The number of images (time points).
    fn time_count(&self) -> u64;

    /// The element type of the images.
    fn data_type(&self) -> DataType;
}

/// The metadata of a series of equally shaped images.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArrayMetadata {
    dims: ArrayShape,
    time_count: u64,
    data_type: DataType,
}

impl ArrayMetadata {
    /// Create new array metadata.
    #[must_use]
    pub fn new(dims: ArrayShape, time_count: u64, data_type: DataType) -> Self {
        Self {
            dims,
            time_count,
            data_type,
        }
    }

    /// Create array metadata from the metadata of `source`.
    #[must_use]
    pub fn from_source<S: ImagesMetadataSource + ?Sized>(source: &S) -> Self {
        Self::new(source.dims().to_vec(), source.time_count(), source.data_type())
    }

    /// The dimensionality of each image.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.dims.len()
    }

    /// The shape of the full array, with the time axis first.
    #[must_use]
    pub fn array_shape(&self) -> ArrayShape {
        std::iter::once(self.time_count)
            .chain(self.dims.iter().copied())
            .collect()
    }

    /// The number of bytes of a single element across all time points.
    #[must_use]
    pub fn series_size(&self) -> u64 {
        self.time_count * self.data_type.size() as u64
    }
}

impl ImagesMetadataSource for ArrayMetadata {
    fn dims(&self) -> &[u64] {
        &self.dims
    }

    fn time_count(&self) -> u64 {
        self.time_count
    }

    fn data_type(&self) -> DataType {
        self.data_type
    }
}
