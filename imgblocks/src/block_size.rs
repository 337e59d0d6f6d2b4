//! Requested block sizes in bytes.

use std::fmt::Display;
use std::str::FromStr;

use thiserror::Error;

/// A block size parse error.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BlockSizeParseError {
    /// The block size string is empty.
    #[error("block size string is empty")]
    Empty,
    /// The numeric part of the block size string is invalid.
    #[error("invalid block size {0}")]
    Invalid(String),
    /// The unit suffix is not recognised.
    #[error("unknown block size unit {unit} in {size}, expected one of k, m, g, t")]
    UnknownUnit {
        /// The unit.
        unit: String,
        /// The block size string.
        size: String,
    },
    /// The block size does not fit in 64 bits.
    #[error("block size {0} overflows")]
    Overflow(String),
}

/// A block size in bytes.
///
/// Parses strings such as `"256k"`, `"150M"`, `"1.5g"` or `"4096"`.
/// Units are binary multiples (`k` is 1024) and are case-insensitive, with an optional trailing `b`.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    derive_more::Display,
    derive_more::From,
)]
#[display("{_0}")]
pub struct BlockSize(u64);

impl BlockSize {
    /// Create a new block size of `bytes`.
    #[must_use]
    pub const fn new(bytes: u64) -> Self {
        Self(bytes)
    }

    /// The number of bytes.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl From<BlockSize> for u64 {
    fn from(size: BlockSize) -> Self {
        size.0
    }
}

fn unit_multiplier(unit: &str) -> Option<u64> {
    let unit = unit.to_ascii_lowercase();
    match unit.strip_suffix('b').unwrap_or(unit.as_str()) {
        "" => Some(1),
        "k" => Some(1 << 10),
        "m" => Some(1 << 20),
        "g" => Some(1 << 30),
        "t" => Some(1 << 40),
        _ => None,
    }
}

impl FromStr for BlockSize {
    type Err = BlockSizeParseError;

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn from_str(size: &str) -> Result<Self, Self::Err> {
        let size = size.trim();
        if size.is_empty() {
            return Err(BlockSizeParseError::Empty);
        }
        let split = size
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(size.len());
        let (mantissa, unit) = size.split_at(split);
        if mantissa.is_empty() {
            return Err(BlockSizeParseError::Invalid(size.to_string()));
        }
        let unit = unit.trim_start();
        let multiplier =
            unit_multiplier(unit).ok_or_else(|| BlockSizeParseError::UnknownUnit {
                unit: unit.to_string(),
                size: size.to_string(),
            })?;

        if let Ok(bytes) = mantissa.parse::<u64>() {
            return bytes
                .checked_mul(multiplier)
                .map(Self)
                .ok_or_else(|| BlockSizeParseError::Overflow(size.to_string()));
        }
        let mantissa = mantissa
            .parse::<f64>()
            .map_err(|_| BlockSizeParseError::Invalid(size.to_string()))?;
        let bytes = mantissa * multiplier as f64;
        if bytes.is_finite() && bytes < u64::MAX as f64 {
            Ok(Self(bytes as u64))
        } else {
            Err(BlockSizeParseError::Overflow(size.to_string()))
        }
    }
}

impl TryFrom<&str> for BlockSize {
    type Error = BlockSizeParseError;

    fn try_from(size: &str) -> Result<Self, Self::Error> {
        size.parse()
    }
}

/// Format a number of bytes with the largest binary unit that keeps the mantissa at least one.
pub(crate) struct HumanBytes(pub(crate) u64);

impl Display for HumanBytes {
    #[allow(clippy::cast_precision_loss)]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
        let mut value = self.0 as f64;
        let mut unit = 0;
        while value >= 1024.0 && unit + 1 < UNITS.len() {
            value /= 1024.0;
            unit += 1;
        }
        if unit == 0 {
            write!(f, "{} {}", self.0, UNITS[0])
        } else {
            write!(f, "{value:.2} {}", UNITS[unit])
        }
    }
}
