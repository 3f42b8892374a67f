//! Colour type definitions and per-format sample arithmetic.

use crate::error::{Error, Result};

/// PNG colour types.
///
/// The discriminants are the values stored in the IHDR chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ColorType {
    /// Grayscale, 1 sample per pixel.
    Gray = 0,
    /// Truecolour RGB, 3 samples per pixel.
    Rgb = 2,
    /// Palette index, 1 sample per pixel.
    Indexed = 3,
    /// Grayscale with alpha, 2 samples per pixel.
    GrayAlpha = 4,
    /// Truecolour with alpha, 4 samples per pixel.
    Rgba = 6,
}

impl ColorType {
    /// Number of samples that make up one pixel in the scanline.
    #[inline]
    pub const fn samples_per_pixel(self) -> usize {
        match self {
            ColorType::Gray | ColorType::Indexed => 1,
            ColorType::GrayAlpha => 2,
            ColorType::Rgb => 3,
            ColorType::Rgba => 4,
        }
    }

    /// Bit depths the format allows for this colour type.
    pub const fn valid_bit_depths(self) -> &'static [u8] {
        match self {
            ColorType::Gray => &[1, 2, 4, 8, 16],
            ColorType::Indexed => &[1, 2, 4, 8],
            ColorType::Rgb | ColorType::GrayAlpha | ColorType::Rgba => &[8, 16],
        }
    }

    /// Returns true if `bit_depth` is allowed for this colour type.
    #[inline]
    pub fn is_valid_bit_depth(self, bit_depth: u8) -> bool {
        self.valid_bit_depths().contains(&bit_depth)
    }

    /// Returns true if the last sample of each pixel is alpha.
    #[inline]
    pub const fn has_alpha(self) -> bool {
        matches!(self, ColorType::GrayAlpha | ColorType::Rgba)
    }

    /// Number of colour (non-alpha) samples per pixel.
    #[inline]
    pub const fn color_samples(self) -> usize {
        match self {
            ColorType::Gray | ColorType::GrayAlpha | ColorType::Indexed => 1,
            ColorType::Rgb | ColorType::Rgba => 3,
        }
    }

    /// Bits occupied by one pixel at `bit_depth`.
    #[inline]
    pub const fn bits_per_pixel(self, bit_depth: u8) -> usize {
        self.samples_per_pixel() * bit_depth as usize
    }

    /// Filter stride: bytes per complete pixel, rounded up, never below one.
    #[inline]
    pub const fn pixel_stride(self, bit_depth: u8) -> usize {
        let bytes = self.bits_per_pixel(bit_depth).div_ceil(8);
        if bytes == 0 {
            1
        } else {
            bytes
        }
    }

    /// Bytes in one unfiltered scanline of `width` pixels.
    #[inline]
    pub fn row_bytes(self, width: u32, bit_depth: u8) -> usize {
        (self.bits_per_pixel(bit_depth) * width as usize).div_ceil(8)
    }
}

impl TryFrom<u8> for ColorType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(ColorType::Gray),
            2 => Ok(ColorType::Rgb),
            3 => Ok(ColorType::Indexed),
            4 => Ok(ColorType::GrayAlpha),
            6 => Ok(ColorType::Rgba),
            _ => Err(Error::InvalidFieldValue {
                field: "colour type",
                value: value as u32,
            }),
        }
    }
}

impl From<ColorType> for u8 {
    fn from(color_type: ColorType) -> Self {
        color_type as u8
    }
}

/// Largest sample value representable at `bit_depth`.
#[inline]
pub const fn max_sample(bit_depth: u8) -> u16 {
    if bit_depth >= 16 {
        u16::MAX
    } else {
        (1u16 << bit_depth) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_per_pixel() {
        assert_eq!(ColorType::Gray.samples_per_pixel(), 1);
        assert_eq!(ColorType::GrayAlpha.samples_per_pixel(), 2);
        assert_eq!(ColorType::Rgb.samples_per_pixel(), 3);
        assert_eq!(ColorType::Rgba.samples_per_pixel(), 4);
        assert_eq!(ColorType::Indexed.samples_per_pixel(), 1);
    }

    #[test]
    fn test_valid_bit_depths() {
        assert!(ColorType::Gray.is_valid_bit_depth(1));
        assert!(ColorType::Gray.is_valid_bit_depth(16));
        assert!(!ColorType::Rgb.is_valid_bit_depth(4));
        assert!(!ColorType::Indexed.is_valid_bit_depth(16));
        assert!(ColorType::Rgba.is_valid_bit_depth(16));
        assert!(!ColorType::GrayAlpha.is_valid_bit_depth(3));
    }

    #[test]
    fn test_try_from_rejects_unknown() {
        assert_eq!(ColorType::try_from(6).unwrap(), ColorType::Rgba);
        for bad in [1u8, 5, 7, 255] {
            assert!(matches!(
                ColorType::try_from(bad),
                Err(Error::InvalidFieldValue { field: "colour type", .. })
            ));
        }
    }

    #[test]
    fn test_pixel_stride() {
        assert_eq!(ColorType::Gray.pixel_stride(1), 1);
        assert_eq!(ColorType::Gray.pixel_stride(16), 2);
        assert_eq!(ColorType::Rgb.pixel_stride(8), 3);
        assert_eq!(ColorType::Rgb.pixel_stride(16), 6);
        assert_eq!(ColorType::Rgba.pixel_stride(16), 8);
        assert_eq!(ColorType::GrayAlpha.pixel_stride(8), 2);
    }

    #[test]
    fn test_row_bytes_rounds_up() {
        // 5 pixels at 4 bits = 20 bits -> 3 bytes
        assert_eq!(ColorType::Indexed.row_bytes(5, 4), 3);
        // 3 pixels at 1 bit -> 1 byte
        assert_eq!(ColorType::Gray.row_bytes(3, 1), 1);
        assert_eq!(ColorType::Rgb.row_bytes(2, 16), 12);
    }

    #[test]
    fn test_max_sample() {
        assert_eq!(max_sample(1), 1);
        assert_eq!(max_sample(4), 15);
        assert_eq!(max_sample(8), 255);
        assert_eq!(max_sample(16), 65535);
    }
}
