//! Image element types.

use crate::DataType;

/// An element error.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ElementError {
    /// Incompatible element type for data type.
    #[error("incompatible element type {element_type} for data type {data_type}")]
    IncompatibleElementType {
        /// The data type of the element.
        element_type: DataType,
        /// The data type of the image.
        data_type: DataType,
    },
}

/// A trait representing an image element type.
pub trait Element: Copy + Default + Send + Sync + 'static {
    /// The data type corresponding to the element type.
    const DATA_TYPE: DataType;

    /// Validate the data type.
    ///
    /// # Errors
    /// Returns an [`ElementError`] if the data type is incompatible with [`Element`].
    fn validate_data_type(data_type: DataType) -> Result<(), ElementError> {
        if data_type == Self::DATA_TYPE {
            Ok(())
        } else {
            Err(ElementError::IncompatibleElementType {
                element_type: Self::DATA_TYPE,
                data_type,
            })
        }
    }
}

macro_rules! impl_element {
    ($raw_type:ty, $data_type:expr) => {
        impl Element for $raw_type {
            const DATA_TYPE: DataType = $data_type;
        }
    };
}

impl_element!(bool, DataType::Bool);
impl_element!(i8, DataType::Int8);
impl_element!(i16, DataType::Int16);
impl_element!(i32, DataType::Int32);
impl_element!(i64, DataType::Int64);
impl_element!(u8, DataType::UInt8);
impl_element!(u16, DataType::UInt16);
impl_element!(u32, DataType::UInt32);
impl_element!(u64, DataType::UInt64);
impl_element!(f32, DataType::Float32);
impl_element!(f64, DataType::Float64);
impl_element!(num::complex::Complex32, DataType::Complex64);
impl_element!(num::complex::Complex64, DataType::Complex128);
