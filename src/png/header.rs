//! IHDR: the image header chunk.

use crate::color::ColorType;
use crate::error::{Error, Result};

/// Length of the IHDR chunk body.
pub const IHDR_LEN: usize = 13;

/// Width and height must stay below this bound.
pub const MAX_DIMENSION: u32 = (1 << 31) - 1;

/// Largest pixel grid an [`Image`](crate::Image) will hold in memory.
pub const MAX_PIXELS: u64 = 1 << 26;

/// Parsed and validated IHDR fields.
///
/// Compression and filter method are always 0 once validated, so they are not
/// stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Bits per sample.
    pub bit_depth: u8,
    /// Pixel format class.
    pub color_type: ColorType,
    /// Interlace method (only 0 is decodable).
    pub interlace_method: u8,
}

impl Header {
    /// Build a non-interlaced header, validating every field.
    pub fn new(width: u32, height: u32, color_type: ColorType, bit_depth: u8) -> Result<Self> {
        validate_dimension("width", width)?;
        validate_dimension("height", height)?;
        validate_bit_depth(color_type, bit_depth)?;
        Ok(Self {
            width,
            height,
            bit_depth,
            color_type,
            interlace_method: 0,
        })
    }

    /// Parse an IHDR body.
    pub fn parse(body: &[u8]) -> Result<Self> {
        if body.len() != IHDR_LEN {
            return Err(Error::InvalidFieldValue {
                field: "IHDR length",
                value: body.len() as u32,
            });
        }

        let width = u32::from_be_bytes([body[0], body[1], body[2], body[3]]);
        let height = u32::from_be_bytes([body[4], body[5], body[6], body[7]]);
        let bit_depth = body[8];
        let color_type = body[9];
        let compression_method = body[10];
        let filter_method = body[11];
        let interlace_method = body[12];

        if compression_method != 0 {
            return Err(Error::InvalidFieldValue {
                field: "compression method",
                value: compression_method as u32,
            });
        }
        if filter_method != 0 {
            return Err(Error::InvalidFieldValue {
                field: "filter method",
                value: filter_method as u32,
            });
        }
        if interlace_method > 1 {
            return Err(Error::InvalidFieldValue {
                field: "interlace method",
                value: interlace_method as u32,
            });
        }
        let color_type = ColorType::try_from(color_type)?;
        validate_bit_depth(color_type, bit_depth)?;
        validate_dimension("width", width)?;
        validate_dimension("height", height)?;

        if interlace_method == 1 {
            return Err(Error::UnsupportedFeature(
                "Adam7 interlaced images".into(),
            ));
        }

        Ok(Self {
            width,
            height,
            bit_depth,
            color_type,
            interlace_method,
        })
    }

    /// Serialize to the 13-byte IHDR body.
    pub fn to_bytes(&self) -> [u8; IHDR_LEN] {
        let mut body = [0u8; IHDR_LEN];
        body[0..4].copy_from_slice(&self.width.to_be_bytes());
        body[4..8].copy_from_slice(&self.height.to_be_bytes());
        body[8] = self.bit_depth;
        body[9] = self.color_type.into();
        // compression method, filter method
        body[10] = 0;
        body[11] = 0;
        body[12] = self.interlace_method;
        body
    }

    /// Bytes in one unfiltered scanline.
    #[inline]
    pub fn row_bytes(&self) -> usize {
        self.color_type.row_bytes(self.width, self.bit_depth)
    }

    /// Byte distance to the corresponding byte of the previous pixel.
    #[inline]
    pub fn pixel_stride(&self) -> usize {
        self.color_type.pixel_stride(self.bit_depth)
    }

    /// Fail if the image is too large to materialize as a pixel grid.
    pub fn check_pixel_count(&self) -> Result<usize> {
        let count = self.width as u64 * self.height as u64;
        if count > MAX_PIXELS {
            return Err(Error::InvalidFieldValue {
                field: "pixel count",
                value: u32::try_from(count).unwrap_or(u32::MAX),
            });
        }
        Ok(count as usize)
    }

    /// Size of the decompressed image data: every row plus its filter byte.
    pub fn filtered_len(&self) -> Result<usize> {
        (self.row_bytes() + 1)
            .checked_mul(self.height as usize)
            .ok_or(Error::InvalidFieldValue {
                field: "height",
                value: self.height,
            })
    }
}

fn validate_dimension(field: &'static str, value: u32) -> Result<()> {
    if value == 0 || value >= MAX_DIMENSION {
        return Err(Error::InvalidFieldValue { field, value });
    }
    Ok(())
}

fn validate_bit_depth(color_type: ColorType, bit_depth: u8) -> Result<()> {
    if !color_type.is_valid_bit_depth(bit_depth) {
        return Err(Error::InvalidFieldValue {
            field: "bit depth",
            value: bit_depth as u32,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(width: u32, height: u32, depth: u8, color: u8, comp: u8, filt: u8, inter: u8) -> Vec<u8> {
        let mut b = Vec::with_capacity(IHDR_LEN);
        b.extend_from_slice(&width.to_be_bytes());
        b.extend_from_slice(&height.to_be_bytes());
        b.extend_from_slice(&[depth, color, comp, filt, inter]);
        b
    }

    #[test]
    fn test_parse_valid() {
        let h = Header::parse(&body(100, 50, 8, 2, 0, 0, 0)).unwrap();
        assert_eq!(h.width, 100);
        assert_eq!(h.height, 50);
        assert_eq!(h.color_type, ColorType::Rgb);
        assert_eq!(h.row_bytes(), 300);
        assert_eq!(h.pixel_stride(), 3);
        assert_eq!(h.filtered_len().unwrap(), 50 * 301);
    }

    #[test]
    fn test_to_bytes_roundtrip() {
        let h = Header::new(7, 3, ColorType::GrayAlpha, 16).unwrap();
        assert_eq!(Header::parse(&h.to_bytes()).unwrap(), h);
    }

    #[test]
    fn test_interlace_is_unsupported() {
        let err = Header::parse(&body(1, 1, 8, 0, 0, 0, 1)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFeature(_)));
    }

    #[test]
    fn test_invalid_fields() {
        let cases = [
            (body(1, 1, 8, 0, 1, 0, 0), "compression method"),
            (body(1, 1, 8, 0, 0, 1, 0), "filter method"),
            (body(1, 1, 8, 0, 0, 0, 2), "interlace method"),
            (body(1, 1, 8, 5, 0, 0, 0), "colour type"),
            (body(1, 1, 4, 2, 0, 0, 0), "bit depth"),
            (body(1, 1, 16, 3, 0, 0, 0), "bit depth"),
            (body(0, 1, 8, 0, 0, 0, 0), "width"),
            (body(1, 0, 8, 0, 0, 0, 0), "height"),
            (body(u32::MAX, 1, 8, 0, 0, 0, 0), "width"),
        ];
        for (data, expected) in cases {
            match Header::parse(&data) {
                Err(Error::InvalidFieldValue { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected {expected} error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_wrong_length() {
        let mut data = body(1, 1, 8, 0, 0, 0, 0);
        data.push(0);
        assert!(matches!(
            Header::parse(&data),
            Err(Error::InvalidFieldValue {
                field: "IHDR length",
                value: 14
            })
        ));
    }

    #[test]
    fn test_sub_byte_row_bytes() {
        let h = Header::new(12, 1, ColorType::Indexed, 2).unwrap();
        assert_eq!(h.row_bytes(), 3);
        assert_eq!(h.pixel_stride(), 1);
        assert_eq!(h.filtered_len().unwrap(), 4);
    }

    #[test]
    fn test_pixel_count_limit() {
        let ok = Header::new(8192, 8192, ColorType::Gray, 1).unwrap();
        assert_eq!(ok.check_pixel_count().unwrap(), 1 << 26);

        let side = MAX_DIMENSION - 1;
        let huge = Header::new(side, side, ColorType::Gray, 1).unwrap();
        assert!(matches!(
            huge.check_pixel_count(),
            Err(Error::InvalidFieldValue {
                field: "pixel count",
                value: u32::MAX
            })
        ));
    }
}
