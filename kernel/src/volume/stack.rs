//! Z-stacks of 2D pixel buffers.
//!
//! Each slice is a row-major buffer of `width * height` samples indexed as
//! `y * width + x`. Stacks are immutable once built and are shared read-only
//! between the caller and any number of searches.

use crate::error::FieldError;
use crate::volume::pixel::PixelType;
use crate::volume::Voxel;

/// Typed sample storage, one `Vec` per z-slice.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelData {
    Gray8(Vec<Vec<u8>>),
    Gray16(Vec<Vec<u16>>),
    Gray32(Vec<Vec<f32>>),
}

impl PixelData {
    fn depth(&self) -> usize {
        match self {
            Self::Gray8(s) => s.len(),
            Self::Gray16(s) => s.len(),
            Self::Gray32(s) => s.len(),
        }
    }

    fn slice_len(&self, z: usize) -> usize {
        match self {
            Self::Gray8(s) => s[z].len(),
            Self::Gray16(s) => s[z].len(),
            Self::Gray32(s) => s[z].len(),
        }
    }
}

/// Global sample range used to rescale 16/32-bit data onto 0–255.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntensityRange {
    pub min: f64,
    pub max: f64,
}

impl IntensityRange {
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidIntensityRange`] if either bound is not
    /// finite or `min > max`.
    pub fn new(min: f64, max: f64) -> Result<Self, FieldError> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(FieldError::InvalidIntensityRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// Map `value` onto 0–255.
    ///
    /// A degenerate range (`min == max`) maps every sample to 0.
    #[must_use]
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0.0;
        }
        255.0 * (value - self.min) / span
    }
}

/// An immutable stack of equally sized grayscale slices.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageStack {
    width: u32,
    height: u32,
    data: PixelData,
}

impl ImageStack {
    /// Build a stack from typed slices, validating every slice length.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::ZeroDimension`], [`FieldError::EmptyStack`], or
    /// [`FieldError::SliceLengthMismatch`].
    pub fn new(width: u32, height: u32, data: PixelData) -> Result<Self, FieldError> {
        if width == 0 || height == 0 {
            return Err(FieldError::ZeroDimension { width, height });
        }
        if data.depth() == 0 {
            return Err(FieldError::EmptyStack);
        }
        let expected = width as usize * height as usize;
        for z in 0..data.depth() {
            let actual = data.slice_len(z);
            if actual != expected {
                return Err(FieldError::SliceLengthMismatch {
                    z,
                    expected,
                    actual,
                });
            }
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// # Errors
    ///
    /// See [`ImageStack::new`].
    pub fn gray8(width: u32, height: u32, slices: Vec<Vec<u8>>) -> Result<Self, FieldError> {
        Self::new(width, height, PixelData::Gray8(slices))
    }

    /// # Errors
    ///
    /// See [`ImageStack::new`].
    pub fn gray16(width: u32, height: u32, slices: Vec<Vec<u16>>) -> Result<Self, FieldError> {
        Self::new(width, height, PixelData::Gray16(slices))
    }

    /// # Errors
    ///
    /// See [`ImageStack::new`].
    pub fn gray32(width: u32, height: u32, slices: Vec<Vec<f32>>) -> Result<Self, FieldError> {
        Self::new(width, height, PixelData::Gray32(slices))
    }

    /// Decode raw little-endian slice buffers of the given sample type.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::RawSliceMisaligned`] if a buffer is not a whole
    /// number of samples, plus any error from [`ImageStack::new`].
    pub fn from_le_bytes(
        pixel_type: PixelType,
        width: u32,
        height: u32,
        slices: &[Vec<u8>],
    ) -> Result<Self, FieldError> {
        let sample_bytes = pixel_type.bytes_per_sample();
        for (z, raw) in slices.iter().enumerate() {
            if raw.len() % sample_bytes != 0 {
                return Err(FieldError::RawSliceMisaligned {
                    z,
                    len: raw.len(),
                    sample_bytes,
                });
            }
        }
        let data = match pixel_type {
            PixelType::Gray8 => PixelData::Gray8(slices.to_vec()),
            PixelType::Gray16 => PixelData::Gray16(
                slices
                    .iter()
                    .map(|raw| {
                        raw.chunks_exact(2)
                            .map(|b| u16::from_le_bytes([b[0], b[1]]))
                            .collect()
                    })
                    .collect(),
            ),
            PixelType::Gray32 => PixelData::Gray32(
                slices
                    .iter()
                    .map(|raw| {
                        raw.chunks_exact(4)
                            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                            .collect()
                    })
                    .collect(),
            ),
        };
        Self::new(width, height, data)
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of z-slices.
    #[must_use]
    pub fn depth(&self) -> u32 {
        // Slice counts come from a Vec built by the caller; anything that does
        // not fit u32 cannot be indexed by voxel coordinates anyway.
        u32::try_from(self.data.depth()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn pixel_type(&self) -> PixelType {
        match self.data {
            PixelData::Gray8(_) => PixelType::Gray8,
            PixelData::Gray16(_) => PixelType::Gray16,
            PixelData::Gray32(_) => PixelType::Gray32,
        }
    }

    #[must_use]
    pub fn data(&self) -> &PixelData {
        &self.data
    }

    /// Samples per slice.
    #[must_use]
    pub fn slice_len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Whether signed coordinates fall inside the stack.
    #[must_use]
    pub fn contains(&self, x: i64, y: i64, z: i64) -> bool {
        x >= 0
            && y >= 0
            && z >= 0
            && x < i64::from(self.width)
            && y < i64::from(self.height)
            && z < i64::from(self.depth())
    }

    #[must_use]
    pub fn contains_voxel(&self, voxel: Voxel) -> bool {
        voxel.x < self.width && voxel.y < self.height && voxel.z < self.depth()
    }

    /// Raw sample at `voxel`, widened to `f64`.
    ///
    /// # Panics
    ///
    /// Panics if `voxel` is outside the stack; callers bound-check first.
    #[must_use]
    pub fn raw_value(&self, voxel: Voxel) -> f64 {
        let z = voxel.z as usize;
        let i = voxel.y as usize * self.width as usize + voxel.x as usize;
        match &self.data {
            PixelData::Gray8(s) => f64::from(s[z][i]),
            PixelData::Gray16(s) => f64::from(s[z][i]),
            PixelData::Gray32(s) => f64::from(s[z][i]),
        }
    }

    /// Global minimum and maximum over every sample.
    ///
    /// NaN samples in float stacks are skipped.
    #[must_use]
    pub fn intensity_range(&self) -> IntensityRange {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut visit = |v: f64| {
            if v < min {
                min = v;
            }
            if v > max {
                max = v;
            }
        };
        match &self.data {
            PixelData::Gray8(s) => s.iter().flatten().for_each(|&v| visit(f64::from(v))),
            PixelData::Gray16(s) => s.iter().flatten().for_each(|&v| visit(f64::from(v))),
            PixelData::Gray32(s) => s
                .iter()
                .flatten()
                .filter(|v| !v.is_nan())
                .for_each(|&v| visit(f64::from(v))),
        }
        if min > max {
            // All samples were NaN.
            return IntensityRange { min: 0.0, max: 0.0 };
        }
        IntensityRange { min, max }
    }
}
