//! Grayscale sample types.

use serde::{Deserialize, Serialize};

use crate::error::FieldError;

/// Bit depth of the samples in an [`super::ImageStack`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelType {
    /// Unsigned 8-bit samples, used directly as 0–255 intensities.
    Gray8,
    /// Unsigned 16-bit samples, normalized against the stack range.
    Gray16,
    /// 32-bit float samples, normalized against the stack range.
    Gray32,
}

impl PixelType {
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Gray8 => 8,
            Self::Gray16 => 16,
            Self::Gray32 => 32,
        }
    }

    #[must_use]
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            Self::Gray8 => 1,
            Self::Gray16 => 2,
            Self::Gray32 => 4,
        }
    }

    /// Whether samples must be rescaled onto 0–255 before cost conversion.
    #[must_use]
    pub const fn needs_normalization(self) -> bool {
        !matches!(self, Self::Gray8)
    }
}

impl TryFrom<u32> for PixelType {
    type Error = FieldError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        match bits {
            8 => Ok(Self::Gray8),
            16 => Ok(Self::Gray16),
            32 => Ok(Self::Gray32),
            _ => Err(FieldError::UnsupportedPixelType { bits }),
        }
    }
}
