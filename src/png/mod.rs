//! PNG codec.
//!
//! Implements the non-interlaced subset of the PNG format (ISO/IEC 15948):
//! chunk framing with CRC checks, the five scanline filters, and sample
//! packing at every bit depth the format defines.

pub mod chunk;
pub mod decode;
pub mod filter;
pub mod header;
pub mod scanline;

pub use chunk::PNG_SIGNATURE;
pub use decode::{decode_png, decode_png_with, DecodedPng};
pub use filter::FilterType;
pub use header::Header;

use log::debug;

use crate::color::ColorType;
use crate::compress::zlib::{StreamCompressor, Zlib};
use crate::error::{Error, Result};
use crate::image::Image;

/// Largest IDAT body written by the encoder.
const MAX_IDAT_SIZE: usize = 256 * 1024;

/// PNG encoding options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PngOptions {
    /// Compression level (1-9, default 6).
    pub compression_level: u8,
    /// Filter selection strategy.
    pub filter_strategy: FilterStrategy,
    /// Emit one tEXt chunk per text attribute.
    pub write_text: bool,
}

impl Default for PngOptions {
    fn default() -> Self {
        Self {
            compression_level: 6,
            // Deterministic output; every row carries filter type 0.
            filter_strategy: FilterStrategy::None,
            write_text: true,
        }
    }
}

impl PngOptions {
    /// Speed-focused preset.
    pub fn fast() -> Self {
        Self {
            compression_level: 1,
            filter_strategy: FilterStrategy::None,
            write_text: true,
        }
    }

    /// Smallest output: adaptive filtering and maximum compression.
    pub fn max_compression() -> Self {
        Self {
            compression_level: 9,
            filter_strategy: FilterStrategy::Adaptive,
            write_text: true,
        }
    }
}

/// How the encoder picks a filter for each row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterStrategy {
    /// No filtering.
    #[default]
    None,
    /// Sub filter on every row.
    Sub,
    /// Up filter on every row.
    Up,
    /// Average filter on every row.
    Average,
    /// Paeth filter on every row.
    Paeth,
    /// Try all filters per row and keep the one with the smallest residuals.
    Adaptive,
}

impl FilterStrategy {
    /// The single filter this strategy always uses, if any.
    pub fn fixed(self) -> Option<FilterType> {
        match self {
            FilterStrategy::None => Some(FilterType::None),
            FilterStrategy::Sub => Some(FilterType::Sub),
            FilterStrategy::Up => Some(FilterType::Up),
            FilterStrategy::Average => Some(FilterType::Average),
            FilterStrategy::Paeth => Some(FilterType::Paeth),
            FilterStrategy::Adaptive => None,
        }
    }
}

/// Encode an image as PNG with default options.
pub fn encode(image: &Image) -> Result<Vec<u8>> {
    encode_with_options(image, &PngOptions::default())
}

/// Encode an image as PNG, compressing with zlib at the configured level.
pub fn encode_with_options(image: &Image, options: &PngOptions) -> Result<Vec<u8>> {
    validate_options(options)?;
    encode_with(image, options, &Zlib::new(options.compression_level))
}

/// Encode an image as PNG with a caller-supplied compressor.
///
/// Emits the signature, IHDR, any tEXt chunks, the IDAT chunks and IEND.
pub fn encode_with(
    image: &Image,
    options: &PngOptions,
    codec: &dyn StreamCompressor,
) -> Result<Vec<u8>> {
    let header = image.header();
    if header.color_type == ColorType::Indexed {
        return Err(Error::UnsupportedFeature("indexed-colour encoding".into()));
    }
    validate_grid(image)?;

    let rows = scanline::pack_rows(image.pixel_grid(), header.bit_depth);
    let filtered = filter::apply_filters(&rows, header.pixel_stride(), options.filter_strategy);
    let compressed = codec.compress(&filtered)?;
    debug!(
        "image data: {} filtered bytes -> {} compressed",
        filtered.len(),
        compressed.len()
    );

    let mut output = Vec::with_capacity(compressed.len() + 128);
    output.extend_from_slice(&PNG_SIGNATURE);
    chunk::write_chunk(&mut output, b"IHDR", &header.to_bytes());
    if options.write_text {
        write_text_chunks(&mut output, image)?;
    }
    write_idat_chunks(&mut output, &compressed);
    chunk::write_chunk(&mut output, b"IEND", &[]);

    Ok(output)
}

fn validate_options(options: &PngOptions) -> Result<()> {
    if !(1..=9).contains(&options.compression_level) {
        return Err(Error::InvalidFieldValue {
            field: "compression_level",
            value: options.compression_level as u32,
        });
    }
    Ok(())
}

/// Pixel setters validate eagerly; this only catches a grid that drifted out
/// of step with the recorded shape.
fn validate_grid(image: &Image) -> Result<()> {
    let grid = image.pixel_grid();
    if grid.is_empty() {
        return Err(Error::InvalidPixelShape("image has no pixels".into()));
    }
    if grid.len() != image.height() as usize {
        return Err(Error::InvalidPixelShape(format!(
            "{} rows for height {}",
            grid.len(),
            image.height()
        )));
    }
    if let Some(y) = grid.iter().position(|row| row.len() != image.width() as usize) {
        return Err(Error::InvalidPixelShape(format!(
            "row {} has {} pixels for width {}",
            y,
            grid[y].len(),
            image.width()
        )));
    }
    Ok(())
}

/// Write tEXt chunks sorted by keyword so output is reproducible.
fn write_text_chunks(output: &mut Vec<u8>, image: &Image) -> Result<()> {
    let mut entries: Vec<_> = image.text_attributes().iter().collect();
    entries.sort();
    for (keyword, text) in entries {
        chunk::write_chunk(output, b"tEXt", &chunk::text_body(keyword, text)?);
    }
    Ok(())
}

fn write_idat_chunks(output: &mut Vec<u8>, compressed: &[u8]) {
    for chunk_data in compressed.chunks(MAX_IDAT_SIZE) {
        chunk::write_chunk(output, b"IDAT", chunk_data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::crc32::chunk_crc;

    /// Walk the chunk framing and return the chunk types in order.
    fn chunk_types(png: &[u8]) -> Vec<[u8; 4]> {
        chunk::ChunkReader::new(png)
            .unwrap()
            .map(|c| c.unwrap().chunk_type)
            .collect()
    }

    #[test]
    fn test_encode_1x1_rgb() {
        let img = Image::new(1, 1, ColorType::Rgb, 8, &[255, 0, 0]).unwrap();
        let png = encode(&img).unwrap();
        assert_eq!(&png[0..8], &PNG_SIGNATURE);
        assert_eq!(chunk_types(&png), vec![*b"IHDR", *b"IDAT", *b"IEND"]);
    }

    #[test]
    fn test_encode_ihdr_fields() {
        let img = Image::blank(100, 50, ColorType::GrayAlpha, 16).unwrap();
        let png = encode(&img).unwrap();
        assert_eq!(&png[8..12], &[0, 0, 0, 13]);
        assert_eq!(&png[12..16], b"IHDR");
        assert_eq!(&png[16..20], &100u32.to_be_bytes());
        assert_eq!(&png[20..24], &50u32.to_be_bytes());
        assert_eq!(png[24], 16);
        assert_eq!(png[25], 4);
        assert_eq!(&png[26..29], &[0, 0, 0]);
        assert_eq!(&png[29..33], &chunk_crc(b"IHDR", &png[16..29]).to_be_bytes());
    }

    #[test]
    fn test_encode_iend_is_last() {
        let img = Image::blank(3, 3, ColorType::Gray, 1).unwrap();
        let png = encode(&img).unwrap();
        assert_eq!(
            &png[png.len() - 12..],
            &[0, 0, 0, 0, b'I', b'E', b'N', b'D', 0xAE, 0x42, 0x60, 0x82]
        );
    }

    #[test]
    fn test_encode_text_chunks_sorted() {
        let mut img = Image::blank(1, 1, ColorType::Gray, 8).unwrap();
        img.set_text("Title", "t").unwrap();
        img.set_text("Author", "a").unwrap();
        let png = encode(&img).unwrap();
        assert_eq!(
            chunk_types(&png),
            vec![*b"IHDR", *b"tEXt", *b"tEXt", *b"IDAT", *b"IEND"]
        );
        let without = encode_with_options(
            &img,
            &PngOptions {
                write_text: false,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(chunk_types(&without), vec![*b"IHDR", *b"IDAT", *b"IEND"]);
    }

    #[test]
    fn test_encode_rejects_bad_level() {
        let img = Image::blank(1, 1, ColorType::Gray, 8).unwrap();
        let options = PngOptions {
            compression_level: 0,
            ..Default::default()
        };
        assert!(matches!(
            encode_with_options(&img, &options),
            Err(Error::InvalidFieldValue {
                field: "compression_level",
                value: 0
            })
        ));
    }

    #[test]
    fn test_large_idat_is_split() {
        let mut compressed = Vec::new();
        write_idat_chunks(&mut compressed, &vec![7u8; MAX_IDAT_SIZE + 10]);
        let mut framed = PNG_SIGNATURE.to_vec();
        framed.extend_from_slice(&compressed);
        assert_eq!(chunk_types(&framed), vec![*b"IDAT", *b"IDAT"]);
    }

    #[test]
    fn test_every_strategy_roundtrips() {
        let mut img = Image::blank(5, 4, ColorType::Rgba, 8).unwrap();
        for y in 0..4 {
            for x in 0..5 {
                let v = (x * 40 + y * 17) as u16;
                img.set_pixel(x, y, vec![v, 255 - v, v / 2, 200]).unwrap();
            }
        }
        for strategy in [
            FilterStrategy::None,
            FilterStrategy::Sub,
            FilterStrategy::Up,
            FilterStrategy::Average,
            FilterStrategy::Paeth,
            FilterStrategy::Adaptive,
        ] {
            let options = PngOptions {
                filter_strategy: strategy,
                ..Default::default()
            };
            let png = encode_with_options(&img, &options).unwrap();
            let decoded = Image::decode(&png).unwrap();
            assert_eq!(decoded.get_pixels(), img.get_pixels(), "{strategy:?}");
        }
    }

    #[test]
    fn test_presets() {
        assert_eq!(PngOptions::fast().compression_level, 1);
        assert_eq!(
            PngOptions::max_compression().filter_strategy,
            FilterStrategy::Adaptive
        );
        assert_eq!(PngOptions::default().filter_strategy, FilterStrategy::None);
    }
}
